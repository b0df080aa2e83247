use proc_macro::TokenStream;
use quote::quote;

use syn::meta::ParseNestedMeta;
use syn::parse::{Parse as _, Parser as _};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned as _;
use syn::{
    Attribute, Data, DeriveInput, Error, FnArg, GenericArgument, ImplItem, ItemImpl, Pat,
    PathArguments, ReturnType, Token, Type,
};

const INJECT_ATTR: &str = "inject";
const FACTORY_ATTR: &str = "factory";

/// Declarations shared by the derives and the `#[component]` attribute.
#[derive(Default)]
struct Declarations {
    module: bool,
    imports: Vec<Type>,
    exports: Vec<Type>,
    providers: Vec<Type>,
    implements: Vec<Type>,
}

impl Declarations {
    fn parse_meta(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("module") {
            self.module = true;
            return Ok(());
        }
        let list = if meta.path.is_ident("imports") {
            &mut self.imports
        } else if meta.path.is_ident("exports") {
            &mut self.exports
        } else if meta.path.is_ident("providers") {
            &mut self.providers
        } else if meta.path.is_ident("implements") {
            &mut self.implements
        } else {
            return Err(meta.error(
                "expected one of `module`, `imports`, `exports`, `providers`, `implements`",
            ));
        };
        let content;
        syn::parenthesized!(content in meta.input);
        let types: Punctuated<Type, Token![,]> = content.parse_terminated(Type::parse, Token![,])?;
        list.extend(types);
        Ok(())
    }

    fn parse_attrs(&mut self, attrs: &[Attribute], name: &str) -> syn::Result<()> {
        for attr in attrs {
            if attr.path().is_ident(name) {
                attr.parse_nested_meta(|meta| self.parse_meta(meta))?;
            }
        }
        Ok(())
    }

    fn component(&self) -> proc_macro2::TokenStream {
        let constructor = if self.module {
            quote! { ::pid::Component::<Self>::module() }
        } else {
            quote! { ::pid::Component::<Self>::injectable() }
        };
        let imports = &self.imports;
        let exports = &self.exports;
        let providers = &self.providers;
        let implements = &self.implements;
        quote! {
            #constructor
                #(.import::<#imports>())*
                #(.export::<#exports>())*
                #(.provider::<#providers>())*
                #(.implements::<#implements>(
                    |this| -> ::std::sync::Arc<#implements> { this }
                ))*
        }
    }
}

/// How a field or a factory parameter is bound.
enum Binding {
    Instance(Type),
    Deferred(Type),
    Tag,
}

impl Binding {
    fn of(ty: &Type) -> Option<Self> {
        if let Some(inner) = extract_generic_type(ty, "Arc") {
            return Some(Self::Instance(inner));
        }
        if let Some(inner) = extract_generic_type(ty, "Deferred") {
            return Some(Self::Deferred(inner));
        }
        if let Type::Path(type_path) = ty
            && type_path.qself.is_none()
            && let Some(segment) = type_path.path.segments.last()
            && segment.ident == "Tag"
            && segment.arguments.is_empty()
        {
            return Some(Self::Tag);
        }
        None
    }

    fn dependency(&self, name: &str) -> proc_macro2::TokenStream {
        match self {
            Binding::Instance(inner) => quote! { .dependency::<#inner>(#name) },
            Binding::Deferred(inner) => quote! { .deferred::<#inner>(#name) },
            Binding::Tag => quote! { .dependency::<::pid::Tag>(#name) },
        }
    }

    fn extract(&self, name: &str) -> proc_macro2::TokenStream {
        match self {
            Binding::Instance(inner) => quote! { args.get::<#inner>(#name)? },
            Binding::Deferred(inner) => quote! { args.deferred::<#inner>(#name)? },
            Binding::Tag => quote! {
                ::std::clone::Clone::clone(args.get::<::pid::Tag>(#name)?.as_ref())
            },
        }
    }
}

fn extract_generic_type(ty: &Type, wrapper: &str) -> Option<Type> {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident == wrapper
        && let PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(GenericArgument::Type(inner)) = args.args.first()
    {
        return Some(inner.clone());
    }
    None
}

fn has_inject_default(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut default = false;
    for attr in attrs {
        if attr.path().is_ident(INJECT_ATTR) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    default = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `default`"))
                }
            })?;
        }
    }
    Ok(default)
}

/// Derive macro for leaf providers.
///
/// Fields of type `Arc<T>`, `Deferred<T>` and `Tag` become dependencies named after the
/// field. Fields marked `#[inject(default)]` are initialized with `Default::default()`.
/// `#[injectable(providers(..), implements(..))]` adds declarations.
#[proc_macro_derive(Injectable, attributes(injectable, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let mut declarations = Declarations::default();
    if let Err(err) = declarations.parse_attrs(&input.attrs, "injectable") {
        return TokenStream::from(err.to_compile_error());
    }
    handle_derive(input, declarations)
}

/// Derive macro for modules.
///
/// Fields follow the same rules as for `Injectable`. Declarations are read from
/// `#[module(imports(..), exports(..), providers(..), implements(..))]`.
#[proc_macro_derive(Module, attributes(module, inject))]
pub fn derive_module(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let mut declarations = Declarations {
        module: true,
        ..Default::default()
    };
    if let Err(err) = declarations.parse_attrs(&input.attrs, "module") {
        return TokenStream::from(err.to_compile_error());
    }
    handle_derive(input, declarations)
}

/// Attribute macro for impl blocks with a factory method.
///
/// Accepts the same declarations as the derives, plus `module` to declare a module.
#[proc_macro_attribute]
pub fn component(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut declarations = Declarations::default();
    let parser = syn::meta::parser(|meta| declarations.parse_meta(meta));
    if let Err(err) = parser.parse(attr) {
        return TokenStream::from(err.to_compile_error());
    }
    if let Ok(item_impl) = syn::parse::<ItemImpl>(item) {
        return handle_component_impl(item_impl, declarations);
    }
    TokenStream::from(
        Error::new(
            proc_macro2::Span::call_site(),
            "#[component] can only be applied to impl blocks",
        )
        .to_compile_error(),
    )
}

fn handle_derive(input: DeriveInput, declarations: Declarations) -> TokenStream {
    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(s) => &s.fields,
        _ => {
            return TokenStream::from(
                Error::new(name.span(), "Only structs are supported").to_compile_error(),
            );
        }
    };

    let mut dependency_stmts = Vec::new();
    let mut field_inits = Vec::new();

    match fields {
        syn::Fields::Named(fields) => {
            for field in &fields.named {
                let Some(field_ident) = field.ident.as_ref() else {
                    continue;
                };
                let field_ty = &field.ty;
                let field_name = field_ident.to_string();

                match has_inject_default(&field.attrs) {
                    Ok(true) => {
                        field_inits.push(quote! {
                            #field_ident: ::std::default::Default::default()
                        });
                        continue;
                    }
                    Ok(false) => {}
                    Err(err) => return TokenStream::from(err.to_compile_error()),
                }

                let Some(binding) = Binding::of(field_ty) else {
                    return TokenStream::from(
                        Error::new(
                            field_ty.span(),
                            format!(
                                "Dependencies must be of type Arc<T>, Deferred<T> or Tag, \
                                 or use #[{INJECT_ATTR}(default)]"
                            ),
                        )
                        .to_compile_error(),
                    );
                };
                dependency_stmts.push(binding.dependency(&field_name));
                let extract = binding.extract(&field_name);
                field_inits.push(quote! { #field_ident: #extract });
            }
        }
        syn::Fields::Unnamed(_) => {
            return TokenStream::from(
                Error::new(name.span(), "Tuple structs are not supported").to_compile_error(),
            );
        }
        syn::Fields::Unit => {}
    }

    let constructor = if matches!(fields, syn::Fields::Unit) {
        quote! { Self }
    } else {
        quote! { Self { #(#field_inits,)* } }
    };
    let component = declarations.component();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    quote! {
        impl #impl_generics ::pid::Injectable for #name #ty_generics #where_clause {
            fn component() -> ::pid::Component<Self> {
                #component
                    #(#dependency_stmts)*
            }

            fn construct(
                args: &::pid::Arguments
            ) -> ::std::result::Result<Self, ::pid::StdError> {
                let _ = args;
                Ok(#constructor)
            }
        }
    }
    .into()
}

fn handle_component_impl(input: ItemImpl, declarations: Declarations) -> TokenStream {
    if input.trait_.is_some() {
        return TokenStream::from(
            Error::new(input.span(), "Trait impls are not supported").to_compile_error(),
        );
    }

    let self_ty = &input.self_ty;
    let mut factory = None;

    for item in &input.items {
        if let ImplItem::Fn(method) = item {
            for attr in &method.attrs {
                if attr.path().is_ident(FACTORY_ATTR) {
                    if factory.is_some() {
                        return TokenStream::from(
                            Error::new(attr.span(), "Only one factory method allowed")
                                .to_compile_error(),
                        );
                    }
                    factory = Some(method);
                }
            }
        }
    }

    let method = match factory {
        Some(m) => m,
        None => {
            return TokenStream::from(
                Error::new(input.span(), "No factory method found").to_compile_error(),
            );
        }
    };

    if method.sig.asyncness.is_some() {
        return TokenStream::from(
            Error::new(method.sig.span(), "Factory method cannot be async").to_compile_error(),
        );
    }

    let method_name = &method.sig.ident;
    let is_result = match &method.sig.output {
        ReturnType::Default => {
            return TokenStream::from(
                Error::new(method.sig.span(), "Factory method must return Self")
                    .to_compile_error(),
            );
        }
        ReturnType::Type(_, ty) => extract_generic_type(ty, "Result").is_some(),
    };

    let mut dependency_stmts = Vec::new();
    let mut arg_inits = Vec::new();
    let mut arg_names = Vec::new();

    for fn_arg in &method.sig.inputs {
        match fn_arg {
            FnArg::Receiver(_) => {
                return TokenStream::from(
                    Error::new(fn_arg.span(), "Factory method cannot have self parameter")
                        .to_compile_error(),
                );
            }
            FnArg::Typed(pat_type) => {
                let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
                    return TokenStream::from(
                        Error::new(pat_type.pat.span(), "Only simple bindings supported")
                            .to_compile_error(),
                    );
                };
                let arg_name = &pat_ident.ident;
                let dependency_name = arg_name.to_string();
                let dependency_name = dependency_name.trim_start_matches('_');
                let Some(binding) = Binding::of(&pat_type.ty) else {
                    return TokenStream::from(
                        Error::new(
                            pat_type.ty.span(),
                            "Arguments must be of type Arc<T>, Deferred<T> or Tag",
                        )
                        .to_compile_error(),
                    );
                };
                dependency_stmts.push(binding.dependency(dependency_name));
                let extract = binding.extract(dependency_name);
                arg_inits.push(quote! { let #arg_name = #extract; });
                arg_names.push(quote! { #arg_name });
            }
        }
    }

    // Strip the factory marker so the impl block compiles on its own.
    let mut cleaned_input = input.clone();
    for item in &mut cleaned_input.items {
        if let ImplItem::Fn(method) = item {
            method
                .attrs
                .retain(|attr| !attr.path().is_ident(FACTORY_ATTR));
        }
    }

    let method_call = quote! { Self::#method_name(#(#arg_names),*) };
    let construct_body = if is_result {
        quote! {
            #(#arg_inits)*
            #method_call.map_err(::std::convert::Into::into)
        }
    } else {
        quote! {
            #(#arg_inits)*
            Ok(#method_call)
        }
    };
    let component = declarations.component();

    quote! {
        #cleaned_input

        impl ::pid::Injectable for #self_ty {
            fn component() -> ::pid::Component<Self> {
                #component
                    #(#dependency_stmts)*
            }

            fn construct(
                args: &::pid::Arguments
            ) -> ::std::result::Result<Self, ::pid::StdError> {
                let _ = args;
                #construct_body
            }
        }
    }
    .into()
}
