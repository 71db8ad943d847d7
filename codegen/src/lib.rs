use proc_macro::TokenStream;

mod properties;
mod util;

#[proc_macro_derive(Properties, attributes(properties, property))]
pub fn properties(input: TokenStream) -> TokenStream {
    properties::derive(input.into()).unwrap_or_else(|err| err.to_compile_error()).into()
}
