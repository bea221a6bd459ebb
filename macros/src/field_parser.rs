use proc_macro2::Ident;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, GenericArgument, PathArguments, Type, Visibility};

#[derive(Clone)]
pub enum Optionality {
    /// `Option<T>` field; the lens writes `None` through.
    Optional(Type),
    Required,
}

#[derive(Clone)]
pub struct LensFieldDef {
    pub name: Ident,
    pub tpe: Type,
    pub vis: Visibility,
    pub optionality: Optionality,
}

pub fn get_lens_fields(ast: &DeriveInput) -> Result<Vec<LensFieldDef>, syn::Error> {
    let named = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => return Err(syn::Error::new(ast.ident.span(), "`#[derive(Lenses)]` only supports structs with named fields")),
        },
        _ => return Err(syn::Error::new(ast.ident.span(), "`#[derive(Lenses)]` only supports structs with named fields")),
    };
    named
        .iter()
        .map(|field| match &field.ident {
            None => Err(syn::Error::new(field.span(), "Unnamed fields not supported")),
            Some(name) => Ok(LensFieldDef {
                name: name.clone(),
                tpe: field.ty.clone(),
                vis: field.vis.clone(),
                optionality: match option_inner(&field.ty) {
                    Some(inner) => Optionality::Optional(inner.clone()),
                    None => Optionality::Required,
                },
            }),
        })
        .collect()
}

/// `T` of `Option<T>`, `std::option::Option<T>` or `core::option::Option<T>`, matched syntactically.
pub fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else { return None };
    if type_path.qself.is_some() {
        return None;
    }
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first() {
            Some(GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}
