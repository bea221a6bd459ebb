use crate::field_parser::{LensFieldDef, Optionality};
use crate::macro_utils;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use syn::{DeriveInput, Generics};

fn lens_const(field: &LensFieldDef) -> TokenStream {
    let LensFieldDef { name, tpe, vis, optionality } = field;
    let const_name = format_ident!("{}", macro_utils::to_upper_snake(&name.to_string()));
    match optionality {
        Optionality::Optional(inner) => quote! {
            #vis const #const_name: ::appcell::OptionalField<Self, #inner> =
                ::appcell::OptionalField::new(|c| &c.#name, |c| &mut c.#name);
        },
        Optionality::Required => quote! {
            #vis const #const_name: ::appcell::Field<Self, #tpe> =
                ::appcell::Field::new(|c| &c.#name, |c| &mut c.#name);
        },
    }
}

pub fn lens_impls(struct_ident: &Ident, generics: &Generics, fields: &[LensFieldDef]) -> TokenStream {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let consts = fields.iter().map(lens_const);
    quote! {
        impl #impl_generics #struct_ident #ty_generics #where_clause {
            #(#consts)*
        }
    }
}

pub fn absence_impl(ast: &DeriveInput) -> TokenStream {
    let ident = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    quote! {
        impl #impl_generics ::appcell::Absence for #ident #ty_generics #where_clause {}
    }
}
