use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

pub fn derive_unique(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree
    let ast = parse_macro_input!(input as DeriveInput);

    // Get the type name we are annotating, keeping any generics it declares
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    // Same path trick as the Component derive: `::sparse_ecs` resolves inside the crate through
    // `extern crate self as sparse_ecs;` and outside it through the dependency.
    TokenStream::from(quote! {
        impl #impl_generics ::sparse_ecs::ecs::Unique for #name #ty_generics #where_clause {
        }
    })
}
