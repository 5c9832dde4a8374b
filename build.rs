// Copyright 2023 Remi Bernotavicius

fn main() {
    // Migrations are embedded into the binary, so rebuild when they change.
    println!("cargo:rerun-if-changed=migrations/");
}
