mod tagged_union;
mod type_tag;

use proc_macro::TokenStream;
use proc_macro_error::{abort, proc_macro_error};
use syn::spanned::Spanned;
use syn::{parse_macro_input, Data, DeriveInput};

/// Implements `polyarch::variant::TaggedUnion` and `Default` for an enum whose variants
/// each hold exactly one payload. The first variant is the default alternative.
#[proc_macro_derive(TaggedUnion)]
#[proc_macro_error]
pub fn tagged_union_fn(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    if input.generics.lt_token.is_some() {
        abort!(input.generics.span(), "Generics are not supported");
    }
    match input.data {
        Data::Enum(de) => tagged_union::process_enum(&input.ident, de).into(),
        Data::Struct(_) | Data::Union(_) => {
            abort!(input.ident.span(), "TaggedUnion can only be derived for enums");
        }
    }
}

/// Implements `polyarch::TypeTag`, with the tag taken from `#[type_tag = "..."]`
/// or the type's identifier.
#[proc_macro_derive(TypeTag, attributes(type_tag))]
#[proc_macro_error]
pub fn type_tag_fn(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    if input.generics.lt_token.is_some() {
        abort!(input.generics.span(), "Generics are not supported");
    }
    type_tag::process(&input.ident, &input.attrs).into()
}
