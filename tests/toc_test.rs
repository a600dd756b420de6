//! Integration tests for contents layout.

use brlpage::{parse_str, BraillePage, Engine, EngineConfig, PageSettings};

fn format(body: &str) -> Vec<BraillePage> {
    let config = EngineConfig {
        page: PageSettings::new(20, 8).with_page_numbers(false, false),
        ..Default::default()
    };
    let engine = Engine::new(config).unwrap();
    let xml = format!(
        "<document><section><container type=\"toc\">{}</container></section></document>",
        body
    );
    let mut doc = parse_str(&xml).unwrap();
    engine.translate(&mut doc).unwrap();
    engine.format(&doc).unwrap()
}

fn trimmed(page: &BraillePage) -> Vec<String> {
    page.lines().iter().map(|l| l.trim_end().to_string()).collect()
}

#[test]
fn test_entry_without_leader() {
    let pages = format(
        "<block type=\"tocEntry\">Intro <span type=\"tocPageNumber\">7</span></block>",
    );
    let lines = trimmed(&pages[0]);
    assert_eq!(lines[0], ",intro            #g");
    assert!(!lines[0].contains('"'));
}

#[test]
fn test_long_entry_gets_guide_dots() {
    let pages = format(
        "<block type=\"tocEntry\">Abcdefgh ijklmnop<span type=\"tocPageNumber\">9</span></block>",
    );
    let lines = trimmed(&pages[0]);
    assert_eq!(lines[0], ",abcdefgh");
    assert_eq!(lines[1], "  ijklmnop \"\"\"\"\"\" #i");
}

#[test]
fn test_entry_without_page_number() {
    let pages = format("<block type=\"tocEntry\">Preface</block>");
    assert_eq!(trimmed(&pages[0])[0], ",preface");
}

#[test]
fn test_heading_is_centered() {
    let pages = format(
        "<block type=\"tocHeading\">Contents</block>\
         <block type=\"tocEntry\">Intro <span type=\"tocPageNumber\">7</span></block>",
    );
    let lines = trimmed(&pages[0]);
    assert_eq!(lines[0], "");
    assert_eq!(lines[1], "     ,contents");
    assert_eq!(lines[2], "");
    assert_eq!(lines[3], ",intro            #g");
}

#[test]
fn test_oversized_page_number_is_dropped() {
    let config = EngineConfig {
        page: PageSettings::new(12, 5).with_page_numbers(false, false),
        ..Default::default()
    };
    let engine = Engine::new(config).unwrap();
    let xml = "<document><section><container type=\"toc\">\
         <block type=\"tocEntry\">Intro <span type=\"tocPageNumber\">123456789</span></block>\
         <block type=\"tocEntry\">Index <span type=\"tocPageNumber\">9</span></block>\
         </container></section></document>";
    let mut doc = parse_str(xml).unwrap();
    engine.translate(&mut doc).unwrap();
    let pages = engine.format(&doc).unwrap();

    let lines = trimmed(&pages[0]);
    assert_eq!(lines[0], ",intro");
    assert_eq!(lines[1], ",index    #i");
}
