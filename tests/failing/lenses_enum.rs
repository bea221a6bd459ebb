#![allow(dead_code)]
use appcell::Lenses;

#[derive(Lenses)]
enum Status {
    Loading,
    Ready(String),
}

fn main() {}
