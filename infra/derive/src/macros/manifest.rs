use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::parse::Parser;
use syn::{Attribute, ExprPath, Fields, Ident, ItemStruct, Lit, LitStr, Meta, Path, Type};

/// Accessor names that would collide with the generated inherent methods, with the
/// registry methods reached through `Deref`, or with the derived `Clone`/`Default`.
const RESERVED: &[&str] = &[
    "new",
    "registry",
    "initialize",
    "try_initialize",
    "set_connection",
    "disconnect",
    "invalidate_cached_values",
    "connection",
    "sdk",
    "feature",
    "holder",
    "contains",
    "feature_ids",
    "features",
    "len",
    "is_empty",
    "clone",
    "default",
];

struct ManifestArgs {
    krate: Path,
    serialize: bool,
}

struct FeatureField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    id: LitStr,
    constructor: Option<ExprPath>,
    docs: Vec<&'a Attribute>,
}

/// Expands the `#[feature_manifest]` attribute macro.
pub fn expand_manifest(args: TokenStream, input: ItemStruct) -> TokenStream {
    let ManifestArgs { krate, serialize } = match parse_manifest_args(args) {
        Ok(args) => args,
        Err(err) => return err,
    };

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "feature_manifest does not support generics")
            .to_compile_error();
    }

    let Fields::Named(named) = &input.fields else {
        return syn::Error::new_spanned(
            &input.ident,
            "feature_manifest requires a struct with named fields, one per feature",
        )
        .to_compile_error();
    };

    let features: Vec<FeatureField<'_>> = match named.named.iter().map(parse_field).collect() {
        Ok(features) => features,
        Err(err) => return err,
    };
    if let Some(err) = duplicate_ids_error(&features) {
        return err;
    }

    let name = &input.ident;
    let vis = &input.vis;
    let attrs = &input.attrs;
    let derive_attr = derive_attr(attrs);

    let registry_ty = quote! { #krate::registry::FeatureRegistry };
    let field_idents: Vec<&Ident> = features.iter().map(|f| f.ident).collect();

    let holder_fields = features.iter().map(|f| {
        let (ident, ty) = (f.ident, f.ty);
        quote! { #ident: ::std::sync::Arc<#krate::registry::FeatureHolder<#ty>> }
    });

    let registrations = features.iter().map(|f| {
        let ident = f.ident;
        let descriptor = descriptor_expr(&krate, f, serialize);
        quote! {
            let #ident = __fkit_builder
                .register(#descriptor)
                .expect("feature ids are checked for uniqueness by #[feature_manifest]");
        }
    });

    let accessors = features.iter().map(|f| {
        let (ident, ty, docs) = (f.ident, f.ty, &f.docs);
        quote! {
            #(#docs)*
            #[must_use]
            pub fn #ident(&self) -> &#krate::registry::FeatureHolder<#ty> {
                &self.#ident
            }
        }
    });

    quote! {
        #(#attrs)*
        #derive_attr
        #vis struct #name {
            registry: #registry_ty,
            #(#holder_fields,)*
        }

        #[automatically_derived]
        impl #name {
            /// Builds the manifest with every feature empty and no connection wired.
            #[must_use]
            pub fn new() -> Self {
                let mut __fkit_builder = #registry_ty::builder();
                #(#registrations)*
                Self { registry: __fkit_builder.build(), #(#field_idents),* }
            }

            /// The registry backing this manifest.
            #[must_use]
            pub const fn registry(&self) -> &#registry_ty {
                &self.registry
            }

            #(#accessors)*
        }

        #[automatically_derived]
        impl ::std::default::Default for #name {
            fn default() -> Self {
                Self::new()
            }
        }

        #[automatically_derived]
        impl ::std::ops::Deref for #name {
            type Target = #registry_ty;

            fn deref(&self) -> &Self::Target {
                &self.registry
            }
        }
    }
}

fn parse_manifest_args(args: TokenStream) -> Result<ManifestArgs, TokenStream> {
    let parser = syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated;
    let metas = parser.parse2(args).map_err(|err| err.to_compile_error())?;

    let mut krate: Option<Path> = None;
    let mut serialize = false;
    for meta in metas {
        let name_value = match meta {
            Meta::Path(path) if path.is_ident("serialize") => {
                if serialize {
                    return Err(syn::Error::new_spanned(path, "Duplicate argument").to_compile_error());
                }
                serialize = true;
                continue;
            },
            Meta::NameValue(name_value) => name_value,
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "Expected `serialize` or `crate = \"::fkit\"`",
                )
                .to_compile_error());
            },
        };
        if !name_value.path.is_ident("crate") {
            return Err(syn::Error::new_spanned(
                name_value.path,
                "Unsupported argument; expected `crate`",
            )
            .to_compile_error());
        }
        if krate.is_some() {
            return Err(syn::Error::new_spanned(name_value, "Duplicate argument").to_compile_error());
        }
        let syn::Expr::Lit(syn::ExprLit { lit: Lit::Str(lit), .. }) = &name_value.value else {
            return Err(syn::Error::new_spanned(
                &name_value.value,
                "crate must be a string literal path",
            )
            .to_compile_error());
        };
        krate = Some(lit.parse::<Path>().map_err(|err| err.to_compile_error())?);
    }

    Ok(ManifestArgs { krate: krate.unwrap_or_else(|| syn::parse_quote!(::fkit)), serialize })
}

fn parse_field(field: &syn::Field) -> Result<FeatureField<'_>, TokenStream> {
    let Some(ident) = field.ident.as_ref() else {
        return Err(syn::Error::new_spanned(field, "features must be named fields").to_compile_error());
    };
    if RESERVED.iter().any(|reserved| ident == reserved) {
        return Err(syn::Error::new_spanned(
            ident,
            format!("`{ident}` is reserved; rename the field and set #[feature(name = \"{ident}\")]"),
        )
        .to_compile_error());
    }

    let mut id = None;
    let mut constructor = None;
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("feature")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                if id.is_some() {
                    return Err(meta.error("Duplicate argument"));
                }
                id = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else if meta.path.is_ident("with") {
                if constructor.is_some() {
                    return Err(meta.error("Duplicate argument"));
                }
                constructor = Some(meta.value()?.parse::<ExprPath>()?);
                Ok(())
            } else {
                Err(meta.error("Unsupported feature argument; expected `name` or `with`"))
            }
        })
        .map_err(|err| err.to_compile_error())?;
    }

    let id = id.unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
    if id.value().trim().is_empty() {
        return Err(syn::Error::new_spanned(&id, "feature name cannot be empty").to_compile_error());
    }

    let docs = field.attrs.iter().filter(|attr| attr.path().is_ident("doc")).collect();

    Ok(FeatureField { ident, ty: &field.ty, id, constructor, docs })
}

fn duplicate_ids_error(features: &[FeatureField<'_>]) -> Option<TokenStream> {
    let mut seen = FxHashSet::default();
    features.iter().find(|f| !seen.insert(f.id.value())).map(|f| {
        syn::Error::new_spanned(&f.id, format!("Duplicate feature name `{}`", f.id.value()))
            .to_compile_error()
    })
}

fn descriptor_expr(krate: &Path, feature: &FeatureField<'_>, serialize: bool) -> TokenStream {
    let (id, ty) = (&feature.id, feature.ty);
    let mut descriptor = feature.constructor.as_ref().map_or_else(
        || quote! { #krate::registry::FeatureDescriptor::<#ty>::from_variables(#id) },
        |constructor| quote! { #krate::registry::FeatureDescriptor::<#ty>::new(#id, #constructor) },
    );

    if let Some(doc) = doc_text(&feature.docs) {
        descriptor = quote! { #descriptor.with_doc(#doc) };
    }
    if serialize {
        descriptor = quote! { #descriptor.serializable() };
    }
    descriptor
}

/// Joins `///` lines into a single trimmed string.
fn doc_text(docs: &[&Attribute]) -> Option<String> {
    let lines: Vec<String> = docs
        .iter()
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit { lit: Lit::Str(s), .. }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.trim().to_owned())
        .collect();

    let text = lines.join("\n").trim().to_owned();
    if text.is_empty() { None } else { Some(text) }
}

fn derive_attr(attrs: &[Attribute]) -> TokenStream {
    let mut derived = FxHashSet::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(segment) = meta.path.segments.last() {
                derived.insert(segment.ident.to_string());
            }
            Ok(())
        });
    }

    let missing: Vec<Ident> = ["Debug", "Clone"]
        .into_iter()
        .filter(|name| !derived.contains(*name))
        .map(|name| format_ident!("{name}"))
        .collect();

    if missing.is_empty() {
        quote! {}
    } else {
        quote! { #[derive(#(#missing),*)] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(item: TokenStream) -> String {
        let input: ItemStruct = syn::parse2(item).expect("test input should parse");
        expand_manifest(TokenStream::new(), input).to_string()
    }

    #[test]
    fn test_generates_accessor_and_descriptor_per_feature() {
        let out = expand(quote! {
            pub struct AppFeatures {
                /// Editor punctuation.
                settings: SettingsConfig,
                #[feature(name = "home-screen", with = crate::homescreen)]
                homescreen: HomescreenConfig,
            }
        });

        assert!(out.contains("pub fn settings"));
        assert!(out.contains("pub fn homescreen"));
        assert!(out.contains("from_variables (\"settings\")"));
        assert!(out.contains("\"home-screen\""));
        assert!(out.contains("crate :: homescreen"));
        assert!(out.contains("with_doc (\"Editor punctuation.\")"));
        assert!(!out.contains("compile_error"));
    }

    #[test]
    fn test_duplicate_feature_names_are_rejected() {
        let out = expand(quote! {
            struct Features {
                a: One,
                #[feature(name = "a")]
                b: Two,
            }
        });
        assert!(out.contains("compile_error"));
        assert!(out.contains("Duplicate feature name"));
    }

    #[test]
    fn test_reserved_field_names_are_rejected() {
        for field in ["registry", "initialize", "invalidate_cached_values", "feature", "holder", "len"] {
            let ident = format_ident!("{field}");
            let out = expand(quote! {
                struct Features {
                    #ident: One,
                }
            });
            assert!(out.contains("compile_error"), "`{field}` should be rejected");
            assert!(out.contains(&format!("`{field}` is reserved")));
        }
    }

    #[test]
    fn test_reserved_name_is_allowed_as_feature_id() {
        let out = expand(quote! {
            struct Features {
                #[feature(name = "features")]
                feature_list: One,
            }
        });
        assert!(!out.contains("compile_error"));
        assert!(out.contains("pub fn feature_list"));
        assert!(out.contains("from_variables (\"features\")"));
    }

    #[test]
    fn test_serialize_argument_marks_descriptors() {
        let input: ItemStruct = syn::parse2(quote! { struct Features { a: One } }).unwrap();
        let out = expand_manifest(quote! { serialize }, input).to_string();
        assert!(out.contains(". serializable ()"));

        let input: ItemStruct = syn::parse2(quote! { struct Features { a: One } }).unwrap();
        assert!(!expand_manifest(TokenStream::new(), input).to_string().contains("serializable"));

        let input: ItemStruct = syn::parse2(quote! { struct Features { a: One } }).unwrap();
        let out = expand_manifest(quote! { serialize, serialize }, input).to_string();
        assert!(out.contains("Duplicate argument"));
    }

    #[test]
    fn test_tuple_structs_are_rejected() {
        let out = expand(quote! { struct Features(One); });
        assert!(out.contains("compile_error"));
    }

    #[test]
    fn test_crate_argument_overrides_paths() {
        let input: ItemStruct = syn::parse2(quote! { struct Features { a: One } }).unwrap();
        let out = expand_manifest(quote! { crate = "my_fkit" }, input).to_string();
        assert!(out.contains("my_fkit :: registry :: FeatureRegistry"));
        assert!(!out.contains(":: fkit ::"));
    }

    #[test]
    fn test_doc_text_joins_lines() {
        let item: ItemStruct = syn::parse2(quote! {
            struct Features {
                /// First line.
                ///
                /// Second line.
                a: One,
            }
        })
        .unwrap();
        let Fields::Named(named) = &item.fields else { unreachable!() };
        let docs: Vec<&Attribute> = named.named[0].attrs.iter().collect();
        assert_eq!(doc_text(&docs).as_deref(), Some("First line.\n\nSecond line."));
    }
}
