//! Derive macro for `formbind_core::Record`.
//!
//! The derive turns `#[form(...)]` and `#[binding(...)]` attributes into a
//! static, ordered field-descriptor table plus the trait impls the binder
//! and validator walk.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenTree};
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{
    Attribute, Data, DeriveInput, Fields, GenericArgument, LitInt, LitStr, PathArguments, Type,
    Visibility,
};

/// Derive `formbind_core::Record` and its companion traits.
///
/// The record must implement `Default` and `PartialEq`; the zero-value
/// comparisons behind `required` and embedded collapse rely on both.
#[proc_macro_derive(Record, attributes(form, binding))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand_record(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_record(input: &DeriveInput) -> Result<proc_macro2::TokenStream, syn::Error> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }
    let Data::Struct(struct_data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Record can only be derived for structs",
        ));
    };
    let fields = match &struct_data.fields {
        Fields::Named(fields) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &struct_data.fields,
                "Record requires named fields",
            ));
        },
    };

    let has_hook = parse_container_hook(&input.attrs)?;
    let name = &input.ident;
    let mut helpers = Vec::new();
    let mut descriptors = Vec::new();
    let mut restores = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let spec = parse_field_spec(&field.attrs)?;
        let serde_skipped = serde_skips(&field.attrs);
        if serde_skipped {
            restores.push(quote! {
                ::core::mem::swap(&mut self.#ident, &mut previous.#ident);
            });
        }
        if spec.skip || matches!(field.vis, Visibility::Inherited) {
            continue;
        }

        let kind = spec.kind(field)?;
        if !serde_skipped {
            match kind {
                FieldKind::Nested => restores.push(quote! {
                    self.#ident.restore_unserialized(&mut previous.#ident);
                }),
                FieldKind::Embedded | FieldKind::Indirect => restores.push(quote! {
                    if let (::core::option::Option::Some(current), ::core::option::Option::Some(prior)) =
                        (self.#ident.as_mut(), previous.#ident.as_mut())
                    {
                        current.restore_unserialized(prior);
                    }
                }),
                FieldKind::Keyed | FieldKind::Unbound | FieldKind::Inert => {},
            }
        }
        let access = match kind {
            FieldKind::Embedded | FieldKind::Indirect => {
                let get = format_ident!("__indirect_{}", index);
                let get_mut = format_ident!("__indirect_mut_{}", index);
                let embedded = matches!(kind, FieldKind::Embedded);
                helpers.push(quote! {
                    fn #get(record: &#name) -> &dyn ::formbind_core::Indirect {
                        &record.#ident
                    }
                    fn #get_mut(record: &mut #name) -> &mut dyn ::formbind_core::Indirect {
                        &mut record.#ident
                    }
                });
                quote! {
                    ::formbind_core::Access::Indirect {
                        get: #get,
                        get_mut: #get_mut,
                        embedded: #embedded,
                    }
                }
            },
            FieldKind::Nested => {
                let get = format_ident!("__shape_{}", index);
                let get_mut = format_ident!("__shape_mut_{}", index);
                helpers.push(quote! {
                    fn #get(record: &#name) -> &dyn ::formbind_core::Shape {
                        &record.#ident
                    }
                    fn #get_mut(record: &mut #name) -> &mut dyn ::formbind_core::Shape {
                        &mut record.#ident
                    }
                });
                quote! {
                    ::formbind_core::Access::Nested {
                        get: #get,
                        get_mut: #get_mut,
                    }
                }
            },
            FieldKind::Keyed => {
                let slot = format_ident!("__slot_{}", index);
                helpers.push(quote! {
                    fn #slot(record: &mut #name) -> &mut dyn ::formbind_core::FormField {
                        &mut record.#ident
                    }
                });
                quote! { ::formbind_core::Access::Value(#slot) }
            },
            FieldKind::Unbound => quote! { ::formbind_core::Access::Unbound },
            FieldKind::Inert => continue,
        };

        let value = format_ident!("__value_{}", index);
        helpers.push(quote! {
            fn #value(record: &#name) -> &dyn ::formbind_core::Constrained {
                &record.#ident
            }
        });

        let label = LitStr::new(&ident.unraw().to_string(), ident.span());
        let key = spec.key.as_ref().map_or_else(
            || quote! { ::core::option::Option::None },
            |key| quote! { ::core::option::Option::Some(#key) },
        );
        let rules = &spec.rules;
        descriptors.push(quote! {
            ::formbind_core::Field {
                name: #label,
                key: #key,
                rules: &[#(#rules),*],
                value: #value,
                access: #access,
            }
        });
    }

    let hook = if has_hook {
        quote! {
            fn validation_hook(&self) -> ::core::option::Option<&dyn ::formbind_core::ValidateHook> {
                ::core::option::Option::Some(self)
            }
        }
    } else {
        quote! {}
    };

    let restore = if restores.is_empty() {
        quote! {}
    } else {
        quote! {
            fn restore_unserialized(&mut self, previous: &mut Self) {
                use ::formbind_core::Record as _;
                #(#restores)*
            }
        }
    };

    Ok(quote! {
        const _: () = {
            #(#helpers)*

            #[automatically_derived]
            impl ::formbind_core::Record for #name {
                const FIELDS: &'static [::formbind_core::Field<Self>] = &[#(#descriptors),*];

                #hook

                #restore
            }

            #[automatically_derived]
            impl ::formbind_core::Shape for #name {
                fn bind_shape(
                    &mut self,
                    bag: &::formbind_core::InputBag<'_>,
                    errors: &mut ::formbind_core::Errors,
                ) {
                    ::formbind_core::map_form(self, bag, errors);
                }

                fn validate_shape(&self, errors: &mut ::formbind_core::Errors) {
                    ::formbind_core::validate_fields(self, errors);
                }
            }

            #[automatically_derived]
            impl ::formbind_core::Constrained for #name {
                fn is_zero(&self) -> bool {
                    *self == <Self as ::core::default::Default>::default()
                }
            }

            #[automatically_derived]
            impl ::formbind_core::Validatable for #name {
                fn validate_into(
                    &self,
                    context: &::formbind_core::RequestContext,
                    errors: ::formbind_core::Errors,
                ) -> ::formbind_core::Errors {
                    ::formbind_core::validate_record(self, context, errors)
                }
            }

            #[automatically_derived]
            impl ::formbind_core::RecordSlot for #name {
                type Record = Self;

                fn record_mut(&mut self) -> &mut Self {
                    self
                }
            }

            #[automatically_derived]
            impl<'formbind> ::formbind_core::BindTarget<'formbind> for #name {
                type Record = Self;

                fn resolve(
                    self,
                ) -> ::core::result::Result<&'formbind mut Self, ::formbind_core::FieldError> {
                    ::core::result::Result::Err(::formbind_core::FieldError::input_not_by_reference())
                }
            }
        };
    })
}

fn parse_container_hook(attrs: &[Attribute]) -> Result<bool, syn::Error> {
    let mut hook = false;
    for attr in attrs {
        if attr.path().is_ident("form") {
            return Err(syn::Error::new_spanned(
                attr,
                "form attributes belong on fields",
            ));
        }
        if !attr.path().is_ident("binding") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("hook") {
                if hook {
                    return Err(meta.error("duplicate binding(hook)"));
                }
                hook = true;
                return Ok(());
            }
            Err(meta.error("unsupported binding attribute on container"))
        })?;
    }
    Ok(hook)
}

#[derive(Default)]
struct FieldSpec {
    key: Option<LitStr>,
    skip: bool,
    nested: bool,
    embed: bool,
    rules: Vec<proc_macro2::TokenStream>,
}

#[derive(Clone, Copy)]
enum FieldKind {
    Embedded,
    Indirect,
    Nested,
    Keyed,
    Unbound,
    Inert,
}

impl FieldSpec {
    fn kind(&self, field: &syn::Field) -> Result<FieldKind, syn::Error> {
        let optional = option_inner(&field.ty).is_some();
        if self.embed {
            if self.nested || self.key.is_some() {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "form(embed) cannot be combined with nested or a key",
                ));
            }
            if !optional {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "form(embed) requires an Option<Record> or Option<Box<Record>> field",
                ));
            }
            return Ok(FieldKind::Embedded);
        }
        if self.nested {
            if self.key.is_some() {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "form(nested) fields are addressed by their own keys",
                ));
            }
            return Ok(if optional {
                FieldKind::Indirect
            } else {
                FieldKind::Nested
            });
        }
        if self.key.is_some() {
            return Ok(FieldKind::Keyed);
        }
        if self.rules.is_empty() {
            Ok(FieldKind::Inert)
        } else {
            Ok(FieldKind::Unbound)
        }
    }
}

fn parse_field_spec(attrs: &[Attribute]) -> Result<FieldSpec, syn::Error> {
    let mut spec = FieldSpec::default();
    for attr in attrs {
        if attr.path().is_ident("form") {
            if let Ok(key) = attr.parse_args::<LitStr>() {
                set_key(&mut spec, key, attr)?;
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let key: LitStr = meta.value()?.parse()?;
                    if spec.key.is_some() {
                        return Err(meta.error("duplicate form key"));
                    }
                    spec.key = Some(key);
                    return Ok(());
                }
                if meta.path.is_ident("skip") {
                    spec.skip = true;
                    return Ok(());
                }
                if meta.path.is_ident("nested") {
                    spec.nested = true;
                    return Ok(());
                }
                if meta.path.is_ident("embed") {
                    spec.embed = true;
                    return Ok(());
                }
                Err(meta.error("unsupported form attribute on field"))
            })?;
            continue;
        }
        if attr.path().is_ident("binding") {
            attr.parse_nested_meta(|meta| {
                let rule = if meta.path.is_ident("required") {
                    quote! { ::formbind_core::Rule::Required }
                } else if meta.path.is_ident("alpha_dash") {
                    quote! { ::formbind_core::Rule::AlphaDash }
                } else if meta.path.is_ident("alpha_dash_dot") {
                    quote! { ::formbind_core::Rule::AlphaDashDot }
                } else if meta.path.is_ident("min_size") {
                    let bound = parse_bound(meta.value()?.parse()?)?;
                    quote! { ::formbind_core::Rule::MinSize(#bound) }
                } else if meta.path.is_ident("max_size") {
                    let bound = parse_bound(meta.value()?.parse()?)?;
                    quote! { ::formbind_core::Rule::MaxSize(#bound) }
                } else if meta.path.is_ident("email") {
                    quote! { ::formbind_core::Rule::Email }
                } else if meta.path.is_ident("url") {
                    quote! { ::formbind_core::Rule::Url }
                } else {
                    return Err(meta.error("unsupported binding rule"));
                };
                spec.rules.push(rule);
                Ok(())
            })?;
        }
    }
    if spec.key.as_ref().is_some_and(|key| key.value().is_empty()) {
        return Err(syn::Error::new(
            Span::call_site(),
            "form key must not be empty; use form(skip) to ignore a field",
        ));
    }
    Ok(spec)
}

/// Whether serde leaves the field out of deserialization.
fn serde_skips(attrs: &[Attribute]) -> bool {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("serde"))
        .filter_map(|attr| attr.meta.require_list().ok())
        .any(|list| {
            list.tokens.clone().into_iter().any(|token| {
                matches!(
                    token,
                    TokenTree::Ident(ident) if ident == "skip" || ident == "skip_deserializing"
                )
            })
        })
}

fn set_key(spec: &mut FieldSpec, key: LitStr, attr: &Attribute) -> Result<(), syn::Error> {
    if spec.key.is_some() {
        return Err(syn::Error::new_spanned(attr, "duplicate form key"));
    }
    spec.key = Some(key);
    Ok(())
}

fn parse_bound(lit: LitInt) -> Result<proc_macro2::TokenStream, syn::Error> {
    let bound: usize = lit.base10_parse()?;
    Ok(quote! { #bound })
}

fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let mut type_arg = None;
    for arg in &args.args {
        if let GenericArgument::Type(inner) = arg {
            type_arg = Some(inner);
            break;
        }
    }
    type_arg
}
