use std::time::{Duration, Instant};

use gfmark::{Format, NodeValue, ParseOptions, Parser, RenderOptions};
use proptest::prelude::*;

const FORMATS: [Format; 3] = [Format::Html, Format::CommonMark, Format::PlainText];

fn render_all(parser: &Parser, input: &str) {
    let doc = parser.parse_str(input);
    for format in FORMATS {
        gfmark::render(&doc, format, &RenderOptions::default());
    }
}

fn commonmark(parser: &Parser, input: &str) -> String {
    parser.render(input, Format::CommonMark, &RenderOptions::default())
}

/// Inline text built from whole emphasis spans, so neighbours touch in
/// every combination
fn emphasis_heavy() -> impl Strategy<Value = String> {
    let token = prop::sample::select(vec![
        "*a*", "_b_", "**c**", "__d__", "~~e~~", "f", "g h", " ", ".", ",",
    ]);
    proptest::collection::vec(token, 1..12).prop_map(|tokens| tokens.concat())
}

/// Paragraph lines mixing pipe rows and delimiter rows
fn pipe_heavy() -> impl Strategy<Value = String> {
    let cell = "[a-z]{1,3}";
    let row = proptest::collection::vec(cell, 1..4).prop_map(|cells| cells.join("|"));
    let delimiter = proptest::collection::vec(
        prop::sample::select(vec!["-", "--", ":-", "-:", ":-:"]),
        1..4,
    )
    .prop_map(|cells| cells.join("|"));
    let line = prop_oneof![row, delimiter, Just(String::new())];
    proptest::collection::vec(line, 1..6).prop_map(|lines| lines.join("\n"))
}

/// Text full of bare URLs, domains and e-mail addresses with trailing
/// punctuation
fn autolink_heavy() -> impl Strategy<Value = String> {
    let token = prop::sample::select(vec![
        "www.a.b", "www.c-d.org/x", "http://e.f/g", "https://h.i/(j)", "k.l@m.no", "(", ")", ".",
        ",", "!", "?", " ", "p", "&amp;",
    ]);
    proptest::collection::vec(token, 1..10).prop_map(|tokens| tokens.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn commonmark_output_is_stable(
        input in prop_oneof![emphasis_heavy(), pipe_heavy(), autolink_heavy()]
    ) {
        let parser = Parser::gfm();
        let once = commonmark(&parser, &input);
        let twice = commonmark(&parser, &once);
        prop_assert_eq!(twice, once, "input: {:?}", input);
    }

    #[test]
    fn parses_arbitrary_bytes(input in proptest::collection::vec(any::<u8>(), 0..512)) {
        let doc = Parser::gfm().parse(&input);
        prop_assert!(doc.is_ok());
    }

    #[test]
    fn renders_markdown_like_text(input in "[#*_`>~\\-\\[\\]()!<>|:. \n\ta-z0-9]{0,300}") {
        render_all(&Parser::default(), &input);
        render_all(&Parser::gfm(), &input);
    }

    #[test]
    fn sourcepos_stays_in_input(input in "[#*_`>\\- \na-z]{1,200}") {
        let doc = Parser::default().parse_str(&input);
        let lines = input.lines().count().max(1);
        for node in doc.root.descendants() {
            if matches!(node.value, NodeValue::Document) {
                continue;
            }
            prop_assert!(node.sourcepos.start.line <= lines);
            prop_assert!(node.sourcepos.end.line <= lines);
        }
    }

    #[test]
    fn plain_text_keeps_words(words in proptest::collection::vec("[a-z]{1,8}", 1..20)) {
        let input = words.join(" ");
        let doc = Parser::default().parse_str(&input);
        prop_assert_eq!(
            gfmark::render(&doc, Format::PlainText, &RenderOptions::default()),
            format!("{input}\n")
        );
    }
}

#[test]
fn test_pathological_nesting_terminates() {
    let parser = Parser::new(ParseOptions {
        max_delimiter_depth: 64,
        ..ParseOptions::gfm()
    })
    .unwrap();

    let inputs = [
        "> ".repeat(10_000),
        "- ".repeat(5_000),
        "[".repeat(20_000),
        "*a ".repeat(5_000),
        "_".repeat(20_000),
        "`".repeat(20_000),
        "<".repeat(2_000) + "a",
        "|".repeat(1_000) + "\n" + &"-|".repeat(400),
        "www.a.b".to_string() + &")".repeat(20_000),
    ];
    for input in &inputs {
        render_all(&parser, input);
    }
}

#[test]
fn test_autolink_trailing_parens_scale_linearly() {
    let parser = Parser::gfm();
    let input = "www.a.b".to_string() + &")".repeat(50_000);

    let started = Instant::now();
    let doc = parser.parse_str(&input);
    assert!(started.elapsed() < Duration::from_secs(5));

    let paragraph = &doc.root.children[0];
    assert!(matches!(
        &paragraph.children[0].value,
        NodeValue::AutoLink(link) if link.url == "http://www.a.b"
    ));
}
