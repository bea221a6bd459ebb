extern crate proc_macro;
mod field_parser;
mod lens;
mod macro_utils;

use proc_macro::TokenStream;
use proc_macro_error::proc_macro_error;
use syn::{parse_macro_input, DeriveInput};

/// Generates one associated lens constant per named field, upper-cased:
/// `username: Option<String>` becomes `USERNAME: appcell::OptionalField<Self, String>`,
/// any other field type becomes an `appcell::Field`. Constants take the field's visibility.
#[proc_macro_derive(Lenses)]
#[proc_macro_error]
pub fn derive_lenses(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let struct_ident = &ast.ident;
    let stream = match field_parser::get_lens_fields(&ast) {
        Ok(fields) => lens::lens_impls(struct_ident, &ast.generics, &fields),
        Err(e) => return e.to_compile_error().into(),
    };
    macro_utils::submit_struct_to_stream(stream, "lenses", struct_ident, "_derive.rs")
}

/// Marks a type as persistable without an absence value: writing it never deletes the stored entry.
#[proc_macro_derive(Absence)]
#[proc_macro_error]
pub fn derive_absence(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let stream = lens::absence_impl(&ast);
    macro_utils::submit_struct_to_stream(stream, "absence", &ast.ident, "_derive.rs")
}
