use proc_macro2::TokenStream;
use proc_macro_error::abort;
use quote::quote;
use syn::spanned::Spanned;
use syn::{DataEnum, Fields, Ident, Type};

pub fn process_enum(ident: &Ident, de: DataEnum) -> TokenStream {
    if de.variants.is_empty() {
        abort!(ident.span(), "TaggedUnion needs at least one variant");
    }

    let mut names = Vec::new();
    let mut variants = Vec::new();
    let mut tys: Vec<Type> = Vec::new();
    for variant in de.variants.iter() {
        let ty = match &variant.fields {
            Fields::Unnamed(fields_unnamed) if fields_unnamed.unnamed.len() == 1 => {
                fields_unnamed.unnamed[0].ty.clone()
            }
            f => {
                abort!(f.span(), "Each variant must hold exactly one unnamed payload");
            }
        };
        names.push(variant.ident.to_string());
        variants.push(variant.ident.clone());
        tys.push(ty);
    }
    let indices: Vec<usize> = (0..variants.len()).collect();
    let first = &variants[0];

    quote!(
        impl ::polyarch::variant::TaggedUnion for #ident {
            const ALTERNATIVES: &'static [&'static str] = &[#(#names),*];

            fn which(&self) -> usize {
                match self {
                    #( Self::#variants(_) => #indices, )*
                }
            }

            fn save_active<M: ::polyarch::serde::ser::SerializeMap>(
                &self,
                map: &mut M,
            ) -> ::core::result::Result<(), M::Error> {
                match self {
                    #( Self::#variants(payload) => ::polyarch::variant::Alternative::save(payload, map), )*
                }
            }

            #[allow(irrefutable_let_patterns)]
            fn load_active<'de, A: ::polyarch::serde::de::MapAccess<'de>>(
                &mut self,
                which: usize,
                map: &mut A,
                faults: &::polyarch::Faults,
            ) -> ::core::result::Result<(), A::Error> {
                match which {
                    #(
                        #indices => {
                            if let Self::#variants(payload) = self {
                                return ::polyarch::variant::Alternative::load(payload, map, faults);
                            }
                            let mut payload: #tys = ::core::default::Default::default();
                            ::polyarch::variant::Alternative::load(&mut payload, map, faults)?;
                            *self = Self::#variants(payload);
                            ::core::result::Result::Ok(())
                        }
                    )*
                    _ => ::core::result::Result::Err(::polyarch::variant::unknown_variant(
                        which,
                        Self::ALTERNATIVES.len(),
                        faults,
                    )),
                }
            }
        }

        impl ::core::default::Default for #ident {
            fn default() -> Self {
                Self::#first(::core::default::Default::default())
            }
        }
    )
}
