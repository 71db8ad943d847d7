use matches2::option_match;
use proc_macro2::TokenStream;
use quote::{format_ident, quote, ToTokens};
use syn::parse::{Parse, ParseStream};
use syn::{Error, Result};

use crate::util::{self, Attr, Named};

const INPUT_TYPE_ERROR: &str = "Properties can only be derived from structs";

pub(crate) fn derive(input: TokenStream) -> Result<TokenStream> {
    let input: syn::DeriveInput = syn::parse2(input)?;
    let generics = util::parse_generics(&input);

    let item_args: Attr<ItemOpt> = Attr::collect(&input.attrs, "properties")?;

    let crate_name = item_args
        .find_one(|opt| option_match!(opt, ItemOpt::DtentityAs(_, ts) => ts))?
        .map_or_else(|| quote!(::dtentity), |(_, ts)| ts.clone());
    let on_changed = item_args
        .find_one(|opt| option_match!(opt, ItemOpt::OnChanged(_, path) => path))?
        .map(|(_, path)| {
            quote! {
                fn on_property_changed(&mut self, name: #crate_name::StringId) { #path(self, name) }
            }
        });
    let finished = item_args
        .find_one(|opt| option_match!(opt, ItemOpt::Finished(_, path) => path))?
        .map(|(_, path)| quote!(fn finished(&mut self) { #path(self) }));

    let fields = match &input.data {
        syn::Data::Struct(data) => &data.fields,
        syn::Data::Enum(data) => return Err(Error::new_spanned(data.enum_token, INPUT_TYPE_ERROR)),
        syn::Data::Union(data) => {
            return Err(Error::new_spanned(data.union_token, INPUT_TYPE_ERROR))
        }
    };

    let mut consts = Vec::new();
    let mut ids = Vec::new();
    let mut accessors = Vec::new();
    let mut types = Vec::new();
    let mut flattened = Vec::new();

    for (ord, field) in fields.iter().enumerate() {
        let field_args: Attr<FieldOpt> = Attr::collect(&field.attrs, "property")?;

        let accessor = match &field.ident {
            Some(ident) => ident.to_token_stream(),
            None => syn::Index::from(ord).to_token_stream(),
        };

        if field_args.find_one(|opt| option_match!(opt, FieldOpt::Skip => ()))?.is_some() {
            continue;
        }

        if field_args.find_one(|opt| option_match!(opt, FieldOpt::Flatten => ()))?.is_some() {
            flattened.push(accessor);
            continue;
        }

        let name_opt =
            field_args.find_one(|opt| option_match!(opt, FieldOpt::Name(_, name) => name))?;
        let name = match name_opt {
            Some((_, name)) => name.value(),
            None => match &field.ident {
                Some(ident) => ident.to_string(),
                None => {
                    return Err(Error::new_spanned(
                        field,
                        "Tuple fields must be named with `#[property(name = \"...\")]`",
                    ))
                }
            },
        };

        let const_ident = format_ident!("__DTENTITY_PROPERTY_{}", ord);
        consts.push(quote! {
            const #const_ident: #crate_name::StringId = #crate_name::StringId::of(#name);
        });
        ids.push(const_ident);
        accessors.push(accessor);
        types.push(&field.ty);
    }

    let body = quote! {
        fn get_property(
            &self,
            name: #crate_name::StringId,
        ) -> ::std::option::Option<#crate_name::property::Value> {
            #(
                if name == #ids {
                    return ::std::option::Option::Some(
                        <#types as #crate_name::property::PropertyValue>::into_value(
                            ::std::clone::Clone::clone(&self.#accessors),
                        ),
                    );
                }
            )*
            #(
                if let ::std::option::Option::Some(value) =
                    #crate_name::property::Properties::get_property(&self.#flattened, name)
                {
                    return ::std::option::Option::Some(value);
                }
            )*
            ::std::option::Option::None
        }

        fn set_property(
            &mut self,
            name: #crate_name::StringId,
            value: &#crate_name::property::Value,
        ) -> bool {
            #(
                if name == #ids {
                    return match <#types as #crate_name::property::PropertyValue>::from_value(value) {
                        ::std::option::Option::Some(value) => {
                            self.#accessors = value;
                            true
                        }
                        ::std::option::Option::None => false,
                    };
                }
            )*
            #(
                if #crate_name::property::Properties::has_property(&self.#flattened, name) {
                    return #crate_name::property::Properties::set_property(
                        &mut self.#flattened,
                        name,
                        value,
                    );
                }
            )*
            false
        }

        fn property_kind(
            &self,
            name: #crate_name::StringId,
        ) -> ::std::option::Option<#crate_name::property::Kind> {
            #(
                if name == #ids {
                    return ::std::option::Option::Some(
                        <#types as #crate_name::property::PropertyValue>::KIND,
                    );
                }
            )*
            #(
                if let ::std::option::Option::Some(kind) =
                    #crate_name::property::Properties::property_kind(&self.#flattened, name)
                {
                    return ::std::option::Option::Some(kind);
                }
            )*
            ::std::option::Option::None
        }

        fn property_names(&self) -> ::std::vec::Vec<#crate_name::StringId> {
            #[allow(unused_mut)]
            let mut names = ::std::vec![#(#ids),*];
            #(
                names.extend(#crate_name::property::Properties::property_names(&self.#flattened));
            )*
            names
        }

        #on_changed
        #finished
    };

    let impl_properties = generics.impl_trait(quote!(#crate_name::property::Properties), body);

    Ok(quote! {
        const _: () = {
            #(#consts)*

            #impl_properties
        };
    })
}

enum ItemOpt {
    DtentityAs(syn::token::Paren, TokenStream),
    OnChanged(syn::Token![=], syn::ExprPath),
    Finished(syn::Token![=], syn::ExprPath),
}

impl Parse for Named<ItemOpt> {
    fn parse(input: ParseStream) -> Result<Self> {
        let name = input.parse::<syn::Ident>()?;

        let value = match name.to_string().as_str() {
            "dtentity_as" => {
                let inner;
                let paren = syn::parenthesized!(inner in input);
                let args = inner.parse()?;
                ItemOpt::DtentityAs(paren, args)
            }
            "on_changed" => ItemOpt::OnChanged(input.parse()?, input.parse()?),
            "finished" => ItemOpt::Finished(input.parse()?, input.parse()?),
            _ => return Err(Error::new_spanned(&name, format!("Unknown argument `{}`", name))),
        };

        Ok(Named { name, value })
    }
}

enum FieldOpt {
    Name(syn::Token![=], syn::LitStr),
    Skip,
    Flatten,
}

impl Parse for Named<FieldOpt> {
    fn parse(input: ParseStream) -> Result<Self> {
        let name = input.parse::<syn::Ident>()?;

        let value = match name.to_string().as_str() {
            "name" => FieldOpt::Name(input.parse()?, input.parse()?),
            "skip" => FieldOpt::Skip,
            "flatten" => FieldOpt::Flatten,
            _ => return Err(Error::new_spanned(&name, format!("Unknown argument `{}`", name))),
        };

        Ok(Named { name, value })
    }
}
