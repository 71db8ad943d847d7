use proc_macro2::TokenStream;
use quote::{quote, quote_spanned, ToTokens};
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Error, Result};

pub(crate) fn parse_generics(input: &syn::DeriveInput) -> ParsedGenerics {
    let generics = &input.generics;

    let (decl, usage) = if input.generics.params.is_empty() {
        (quote!(), quote!())
    } else {
        let decl: Vec<_> = input.generics.params.iter().collect();
        let usage: Vec<_> = input
            .generics
            .params
            .iter()
            .map(|param| match param {
                syn::GenericParam::Type(syn::TypeParam { ident, .. }) => quote!(#ident),
                syn::GenericParam::Lifetime(syn::LifetimeParam { lifetime, .. }) => {
                    quote!(#lifetime)
                }
                syn::GenericParam::Const(syn::ConstParam { ident, .. }) => quote!(#ident),
            })
            .collect();
        (
            quote_spanned!(generics.span() => <#(#decl),*>),
            quote_spanned!(generics.span() => <#(#usage),*>),
        )
    };

    let where_ = &input.generics.where_clause;

    ParsedGenerics { ident: input.ident.clone(), decl, usage, where_: where_.to_token_stream() }
}

pub(crate) struct ParsedGenerics {
    pub(crate) ident:  proc_macro2::Ident,
    pub(crate) decl:   TokenStream,
    pub(crate) usage:  TokenStream,
    pub(crate) where_: TokenStream,
}

impl ParsedGenerics {
    pub(crate) fn impl_trait(&self, trait_: TokenStream, body: TokenStream) -> TokenStream {
        let Self { ident, decl, usage, where_ } = self;
        quote! {
            impl #decl #trait_ for #ident #usage #where_ {
                #body
            }
        }
    }
}

/// A comma-separated list of named options, e.g. `#[foo(a, b = c)]`.
pub(crate) struct Attr<T> {
    pub(crate) items: Vec<Named<T>>,
}

impl<T> Default for Attr<T> {
    fn default() -> Self { Self { items: Vec::new() } }
}

impl<T> Attr<T>
where
    Named<T>: Parse,
{
    /// Merges the options of all attributes with the given name.
    pub(crate) fn collect(attrs: &[syn::Attribute], name: &str) -> Result<Self> {
        let mut ret = Self::default();
        for attr in attrs {
            if attr.path().is_ident(name) {
                let this: Self = attr.parse_args()?;
                ret.items.extend(this.items);
            }
        }
        Ok(ret)
    }
}

impl<T> Attr<T> {
    /// Finds the only option matched by `f`, erroring if it is specified more than once.
    pub(crate) fn find_one<'t, U>(
        &'t self,
        f: impl Fn(&'t T) -> Option<U>,
    ) -> Result<Option<(&'t syn::Ident, U)>> {
        let mut found: Option<(&syn::Ident, U)> = None;
        for item in &self.items {
            if let Some(value) = f(&item.value) {
                if let Some((first, _)) = found {
                    let mut err =
                        Error::new_spanned(&item.name, format!("Duplicate option `{}`", item.name));
                    err.combine(Error::new_spanned(first, "first specified here"));
                    return Err(err);
                }
                found = Some((&item.name, value));
            }
        }
        Ok(found)
    }
}

impl<T> Parse for Attr<T>
where
    Named<T>: Parse,
{
    fn parse(input: ParseStream) -> Result<Self> {
        let items = Punctuated::<Named<T>, syn::Token![,]>::parse_terminated(input)?;
        Ok(Self { items: items.into_iter().collect() })
    }
}

/// An option value together with the identifier that named it.
pub(crate) struct Named<T> {
    pub(crate) name:  syn::Ident,
    pub(crate) value: T,
}
