#![allow(dead_code)]
use appcell::Lenses;

#[derive(Clone, Lenses)]
struct Point(i32, i32);

fn main() {}
