use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Ident, Token, parse_macro_input, punctuated::Punctuated};

/// Builds the trace parser registry from a list of parser crates.
///
/// Every crate `foo_bar` must export a `FooBar` struct implementing
/// `Default` and `common::parser::TraceParser`.
///
/// ```ignore
/// macros::include_parsers!(blaze, flashgraph, graphene);
/// ```
///
/// expands to `PARSER_NAMES`, the `PARSERS` registry and its `parsers()` accessor.
#[proc_macro]
pub fn include_parsers(input: TokenStream) -> TokenStream {
    let crates = parse_macro_input!(input with Punctuated::<Ident, Token![,]>::parse_terminated);

    let mut parsers = Vec::new();
    let mut parsers_caps = Vec::new();
    let mut names = Vec::new();

    for p in crates {
        let p_str = p.to_string();
        parsers_caps.push(format_ident!("{}", p_str.to_case(Case::Pascal)));
        names.push(p_str);
        parsers.push(p);
    }

    quote! {
        /// Crate names of the registered parsers, used for log directives
        pub const PARSER_NAMES: &[&str] = &[#(#names),*];

        pub static PARSERS: std::sync::OnceLock<common::parser::ParserRegistry> = std::sync::OnceLock::new();

        pub fn parsers() -> &'static common::parser::ParserRegistry {
            PARSERS.get_or_init(|| {
                common::parser::ParserRegistry::new(vec![
                    #(std::sync::Arc::new(#parsers::#parsers_caps::default()),)*
                ])
            })
        }
    }
    .into()
}
