//! End-to-end tests: XML in, paginated braille out.

use brlpage::render::PAGE_BREAK;
use brlpage::style::{StyleDef, DEFAULT_STYLE};
use brlpage::{parse_str, BraillePage, Brlpage, Engine, EngineConfig, Error, PageSettings};

/// Configuration without page numbers and with flush-left paragraphs.
fn config(cells: usize, lines: usize) -> EngineConfig {
    let mut config = EngineConfig {
        page: PageSettings::new(cells, lines).with_page_numbers(false, false),
        ..Default::default()
    };
    config.styles.insert(
        "paragraph".to_string(),
        StyleDef::based_on(DEFAULT_STYLE).with_indent(0, 0),
    );
    config
}

fn doc(body: &str) -> String {
    format!("<document><section>{}</section></document>", body)
}

fn paragraphs(words: &[&str]) -> String {
    let body: String = words
        .iter()
        .map(|w| format!("<block type=\"paragraph\">{}</block>", w))
        .collect();
    doc(&body)
}

fn run(config: EngineConfig, xml: &str) -> Vec<BraillePage> {
    let engine = Engine::new(config).unwrap();
    let mut doc = parse_str(xml).unwrap();
    engine.translate(&mut doc).unwrap();
    engine.format(&doc).unwrap()
}

fn trimmed(page: &BraillePage) -> Vec<String> {
    page.lines().iter().map(|l| l.trim_end().to_string()).collect()
}

#[test]
fn test_hello_world_at_width_10() {
    let mut config = config(10, 4);
    config.styles.insert(
        "paragraph".to_string(),
        StyleDef::based_on(DEFAULT_STYLE)
            .with_indent(0, 0)
            .with_lines(1, 0),
    );
    let engine = Engine::new(config).unwrap();
    let mut doc = parse_str(&paragraphs(&["HELLO WORLD"])).unwrap();
    engine.translate(&mut doc).unwrap();
    let pages = engine.format(&doc).unwrap();

    assert_eq!(pages.len(), 1);
    assert_eq!(trimmed(&pages[0]), vec!["", ",,hello", ",,world", ""]);

    let brf = String::from_utf8(engine.to_brf(&pages).unwrap()).unwrap();
    assert!(!brf.contains(PAGE_BREAK));
    assert_eq!(
        brf,
        "          \r\n,,HELLO   \r\n,,WORLD   \r\n          \r\n"
    );
}

#[test]
fn test_process_is_idempotent() {
    let engine = Engine::new(config(20, 5)).unwrap();
    let mut doc = parse_str(&paragraphs(&["One fish", "Two fish", "Red fish"])).unwrap();
    let first = engine.process(&mut doc).unwrap();
    let second = engine.process(&mut doc).unwrap();
    assert_eq!(first, second);

    let mut fresh = parse_str(&paragraphs(&["One fish", "Two fish", "Red fish"])).unwrap();
    assert_eq!(engine.process(&mut fresh).unwrap(), first);
}

#[test]
fn test_overflow_opens_new_page() {
    let mut config = config(10, 3);
    config.page.braille_page_numbers = true;
    let pages = run(config, &paragraphs(&["one", "two", "three", "four", "five"]));

    assert_eq!(pages.len(), 2);
    let first = trimmed(&pages[0]);
    assert_eq!(first[0], "one");
    assert_eq!(first[1], "two");
    assert_eq!(first[2], "three   #a");
    assert_eq!(pages[0].braille_label(), Some("#a"));

    let second = trimmed(&pages[1]);
    assert_eq!(second[0], "four");
    assert_eq!(second[1], "five");
    assert_eq!(second[2], "        #b");
}

#[test]
fn test_brf_separates_pages_with_form_feed() {
    let engine = Engine::new(config(10, 3)).unwrap();
    let mut doc = parse_str(&paragraphs(&["one", "two", "three", "four"])).unwrap();
    let brf = String::from_utf8(engine.process(&mut doc).unwrap()).unwrap();
    assert_eq!(brf.matches(PAGE_BREAK).count(), 1);
    assert!(brf.ends_with("\r\n"));
}

#[test]
fn test_explicit_break_absorbed_at_top() {
    let mut config = config(10, 5);
    config.styles.insert(
        "chapter".to_string(),
        StyleDef::based_on(DEFAULT_STYLE).with_pages(1, 0),
    );
    let xml = doc("<block overrideStyle=\"chapter\">one</block>\
         <block type=\"paragraph\">two</block>\
         <block overrideStyle=\"chapter\">three</block>");
    let pages = run(config, &xml);

    assert_eq!(pages.len(), 2);
    assert_eq!(trimmed(&pages[0])[..2], ["one", "two"]);
    assert_eq!(trimmed(&pages[1])[0], "three");
}

#[test]
fn test_running_head_after_first_page() {
    let mut config = config(10, 3);
    config.page.running_head = Some("Title".to_string());
    let pages = run(config, &paragraphs(&["one", "two", "three", "four", "five"]));

    assert_eq!(pages.len(), 2);
    assert_eq!(trimmed(&pages[0])[0], "one");
    let second = trimmed(&pages[1]);
    assert_eq!(second[0], "  ,title");
    assert_eq!(second[1], "four");
    assert_eq!(second[2], "five");
}

#[test]
fn test_print_page_indicators() {
    let mut config = config(14, 3);
    config.page.print_page_numbers = true;
    config.styles.insert(
        "paragraph".to_string(),
        StyleDef::based_on(DEFAULT_STYLE).with_indent(2, 0),
    );
    let xml = doc("<pageIndicator number=\"5\"/>\
         <block type=\"paragraph\">one</block>\
         <pageIndicator number=\"6\"/>\
         <block type=\"paragraph\">two</block>\
         <block type=\"paragraph\">three</block>");
    let pages = run(config, &xml);

    assert_eq!(pages.len(), 2);
    assert_eq!(
        trimmed(&pages[0]),
        vec!["  one       #e", "----------- #f", "  two"]
    );
    assert_eq!(pages[0].print_label(), Some("#e"));

    // Print page 6 continues on the second braille page
    assert_eq!(pages[1].print_label(), Some("a#f"));
    assert!(pages[1].lines()[0].ends_with("a#f"));
    assert_eq!(trimmed(&pages[1])[0], "  three    a#f");
}

#[test]
fn test_keep_with_next_moves_heading() {
    let config = config(20, 4);
    let xml = doc("<block type=\"paragraph\">one</block>\
         <block type=\"paragraph\">two</block>\
         <block type=\"heading\">Head</block>\
         <block type=\"paragraph\">three</block>");
    let pages = run(config, &xml);

    assert_eq!(pages.len(), 2);
    assert_eq!(trimmed(&pages[0]), vec!["one", "two", "", ""]);
    let second = trimmed(&pages[1]);
    assert_eq!(second[0].trim(), ",head");
    assert_eq!(second[1], "");
    assert_eq!(second[2], "three");
}

#[test]
fn test_empty_document_has_one_page() {
    let pages = run(config(10, 3), "<document/>");
    assert_eq!(pages.len(), 1);
    assert!(pages[0].is_blank());
}

#[test]
fn test_emphasis_and_numbers() {
    let pages = run(
        config(30, 3),
        &doc("<block type=\"paragraph\">Page 12 is <inline type=\"emphasis\" emphasis=\"bold\">here</inline></block>"),
    );
    let line = trimmed(&pages[0])[0].clone();
    assert!(line.starts_with(",page #ab is"));
    assert!(line.contains("here"));
}

#[test]
fn test_builder_unicode_output() {
    let result = Brlpage::new()
        .with_page_size(10, 3)
        .with_encoding(brlpage::Encoding::Unicode)
        .convert_str(&paragraphs(&["ab"]))
        .unwrap();
    let brf = result.to_brf_string().unwrap();
    assert!(brf.chars().all(|c| c == '\r' || c == '\n' || ('\u{2800}'..='\u{283f}').contains(&c)));
    assert_eq!(result.stats.page_count, 1);
}

#[test]
fn test_structural_error_carries_node() {
    let engine = Engine::new(config(20, 5)).unwrap();
    let mut doc = parse_str(&doc("<block type=\"paragraph\"><inline type=\"math\"/></block>")).unwrap();
    match engine.translate(&mut doc) {
        Err(Error::Structural { node, .. }) => assert!(node.contains("inline")),
        other => panic!("expected a structural error, got {:?}", other),
    }
}

#[test]
fn test_malformed_mathml_carries_node() {
    let engine = Engine::new(config(20, 5)).unwrap();
    let xml = doc("<block type=\"paragraph\"><inline type=\"math\">\
         <math><mfrac><mi>a</mi></mfrac></math></inline></block>");
    let mut doc = parse_str(&xml).unwrap();
    match engine.translate(&mut doc) {
        Err(Error::Structural { message, node }) => {
            assert!(message.contains("needs 2 children"));
            assert!(node.contains("mfrac"));
        }
        other => panic!("expected a structural error, got {:?}", other),
    }
}

/// Front-matter paragraphs on a 10x3 page with braille page numbers.
fn numbered(interpoint: bool) -> EngineConfig {
    let mut config = config(10, 3);
    config.page = config.page.with_page_numbers(true, false).with_interpoint(interpoint);
    config.styles.insert(
        "chapter".to_string(),
        StyleDef::based_on(DEFAULT_STYLE).with_pages(1, 0),
    );
    config
}

const FRONT_MATTER: &str = "<section pageType=\"frontMatter\">\
     <block type=\"paragraph\">one</block>\
     <block type=\"paragraph\">two</block>\
     <block type=\"paragraph\">three</block>\
     <block type=\"paragraph\">four</block>\
     </section>";

#[test]
fn test_word_moves_past_number_line() {
    let xml = format!("<document>{}</document>", FRONT_MATTER);
    let pages = run(numbered(false), &xml);

    // "three" fits a full line, so it is not split beside the label
    assert_eq!(pages.len(), 2);
    assert_eq!(trimmed(&pages[0]), vec!["one", "two", "       p#a"]);
    assert_eq!(trimmed(&pages[1]), vec!["three", "four", "       p#b"]);
}

#[test]
fn test_word_longer_than_line_is_split() {
    let pages = run(numbered(false), &paragraphs(&["one", "two", "abcdefghijkl"]));
    let first = trimmed(&pages[0]);
    assert_eq!(first[2], "abcde   #a");
    assert_eq!(trimmed(&pages[1])[0], "fghijkl");
}

#[test]
fn test_interpoint_and_page_types() {
    let xml = format!(
        "<document>{}<section pageType=\"normal\">\
         <block overrideStyle=\"chapter\">five</block></section></document>",
        FRONT_MATTER
    );
    let pages = run(numbered(true), &xml);

    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0].braille_label(), Some("p#a"));
    assert_eq!(trimmed(&pages[0])[2], "       p#a");

    // The verso carries no braille page number
    assert_eq!(pages[1].braille_label(), None);
    assert_eq!(trimmed(&pages[1]), vec!["three", "four", ""]);

    // Normal numbering starts over on the body
    assert_eq!(pages[2].braille_label(), Some("#a"));
    assert_eq!(trimmed(&pages[2]), vec!["five", "", "        #a"]);
}

#[test]
fn test_numbered_verso_when_configured() {
    let mut config = numbered(true);
    config.page.number_verso_pages = true;
    let xml = format!("<document>{}</document>", FRONT_MATTER);
    let pages = run(config, &xml);
    assert_eq!(pages[1].braille_label(), Some("p#b"));
}

#[test]
fn test_restart_numbering() {
    let xml = "<document>\
         <section><block overrideStyle=\"chapter\">one</block></section>\
         <section restartNumbering=\"true\"><block overrideStyle=\"chapter\">two</block></section>\
         <section><block overrideStyle=\"chapter\">three</block></section>\
         </document>";
    let pages = run(numbered(false), xml);

    let labels: Vec<_> = pages.iter().map(|p| p.braille_label()).collect();
    assert_eq!(labels, vec![Some("#a"), Some("#a"), Some("#b")]);
}

#[test]
fn test_blank_lines_dropped_after_overflow() {
    let mut config = config(10, 3);
    config.styles.insert(
        "paragraph".to_string(),
        StyleDef::based_on(DEFAULT_STYLE).with_indent(0, 0).with_lines(1, 0),
    );
    let pages = run(config, &paragraphs(&["one", "two", "three"]));

    assert_eq!(pages.len(), 2);
    // Honored at the start of the document, dropped on the overflow page
    assert_eq!(trimmed(&pages[0]), vec!["", "one", ""]);
    assert_eq!(trimmed(&pages[1]), vec!["two", "", "three"]);
}

#[test]
fn test_list_and_margin_indents() {
    let xml = doc("<container type=\"list\" listType=\"bullet\">\
         <block type=\"listItem\">alpha beta gamma delta</block>\
         <container type=\"list\" listType=\"bullet\">\
         <block type=\"listItem\">one two three</block>\
         </container>\
         </container>\
         <block type=\"margin\" indentLevel=\"1\" runoverLevel=\"2\">alpha beta gamma</block>");
    let pages = run(config(12, 8), &xml);

    assert_eq!(
        trimmed(&pages[0]),
        vec![
            // Top-level item: indent 1, runover 3
            "alpha beta",
            "  gamma",
            "  delta",
            // Nested item: indent 3, runover 5
            "  one two",
            "    three",
            // Margin block: indent 3, runover 5
            "  alpha beta",
            "    gamma",
            "",
        ]
    );
}
