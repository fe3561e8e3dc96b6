use proc_macro2::TokenStream;
use proc_macro_error::abort;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Attribute, Expr, ExprLit, Ident, Lit, Meta};

pub fn process(ident: &Ident, attrs: &[Attribute]) -> TokenStream {
    let mut tag = ident.to_string();
    for attr in attrs {
        if !attr.path().is_ident("type_tag") {
            continue;
        }
        match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => tag = s.value(),
                v => abort!(v.span(), "Expected a string literal"),
            },
            m => abort!(m.span(), "Expected #[type_tag = \"...\"]"),
        }
    }
    if tag.is_empty() {
        abort!(ident.span(), "Type tag cannot be empty");
    }

    quote!(
        impl ::polyarch::TypeTag for #ident {
            const TAG: &'static str = #tag;
        }
    )
}
