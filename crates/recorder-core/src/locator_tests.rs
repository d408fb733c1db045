use super::*;

struct Page {
    doc: Document,
    body: NodeId,
}

fn page() -> Page {
    let mut doc = Document::new();
    let html = doc.append_element(doc.root(), "html");
    doc.append_element(html, "head");
    let body = doc.append_element(html, "body");
    Page { doc, body }
}

#[test]
fn test_root_is_plain_html() {
    let p = page();
    let html = p.doc.document_element().unwrap();
    assert_eq!(locate(&p.doc, html).to_string(), "/html");
}

#[test]
fn test_id_form() {
    let mut p = page();
    let input = p.doc.append_element(p.body, "input");
    p.doc.set_attribute(input, "id", "email");

    let locator = locate(&p.doc, input);
    assert_eq!(locator.to_string(), r#"//*[@id="email"]"#);
    assert_eq!(resolve(&p.doc, &locator), Ok(input));
}

#[test]
fn test_position_written_only_when_tag_repeats() {
    let mut p = page();
    let first = p.doc.append_element(p.body, "div");
    p.doc.append_element(p.body, "span");
    let second = p.doc.append_element(p.body, "div");
    let lonely = p.doc.append_element(p.body, "p");

    assert_eq!(locate(&p.doc, first).to_string(), "/html/body/div[1]");
    assert_eq!(locate(&p.doc, second).to_string(), "/html/body/div[2]");
    assert_eq!(locate(&p.doc, lonely).to_string(), "/html/body/p");
}

#[test]
fn test_nested_path() {
    let mut p = page();
    p.doc.append_element(p.body, "div");
    let div = p.doc.append_element(p.body, "div");
    let form = p.doc.append_element(div, "form");
    p.doc.append_element(form, "input");
    let input = p.doc.append_element(form, "input");

    let locator = locate(&p.doc, input);
    assert_eq!(locator.to_string(), "/html/body/div[2]/form/input[2]");
    assert_eq!(resolve(&p.doc, &locator), Ok(input));
}

#[test]
fn test_text_siblings_do_not_count() {
    let mut p = page();
    p.doc.append_text(p.body, "hello");
    let div = p.doc.append_element(p.body, "div");
    assert_eq!(locate(&p.doc, div).to_string(), "/html/body/div");
}

#[test]
fn test_duplicate_id_falls_back_to_path() {
    let mut p = page();
    let a = p.doc.append_element(p.body, "button");
    let b = p.doc.append_element(p.body, "button");
    p.doc.set_attribute(a, "id", "go");
    p.doc.set_attribute(b, "id", "go");

    let locator = locate(&p.doc, b);
    assert_eq!(locator.to_string(), "/html/body/button[2]");
    assert_eq!(resolve(&p.doc, &locator), Ok(b));
}

#[test]
fn test_detached_element_has_empty_locator() {
    let mut p = page();
    let div = p.doc.append_element(p.body, "div");
    let inner = p.doc.append_element(div, "span");
    p.doc.detach(div);

    let locator = locate(&p.doc, inner);
    assert!(locator.is_detached());
    assert_eq!(locator.to_string(), "");
    assert!(matches!(
        resolve(&p.doc, &locator),
        Err(LocatorError::NotFound(_))
    ));
}

#[test]
fn test_resolve_survives_attribute_changes() {
    let mut p = page();
    let div = p.doc.append_element(p.body, "div");
    let locator = locate(&p.doc, div);
    p.doc.set_attribute(div, "class", "changed");
    p.doc.set_attribute(div, "data-x", "1");
    assert_eq!(resolve(&p.doc, &locator), Ok(div));
}

#[test]
fn test_resolve_missing_element() {
    let p = page();
    let locator: Locator = "/html/body/div[3]".parse().unwrap();
    assert_eq!(
        resolve(&p.doc, &locator),
        Err(LocatorError::NotFound("/html/body/div[3]".to_string()))
    );
}

#[test]
fn test_every_element_round_trips() {
    let doc = Document::parse_html(
        r#"<html><head><title>t</title></head><body>
        <div><p>a</p><p>b</p><ul><li>1</li><li id="two">2</li><li>3</li></ul></div>
        <div><form><input name="q"><input type="submit"></form></div>
        <table><tr><td>x</td><td>y</td></tr></table>
        </body></html>"#,
    );
    for element in doc.elements() {
        let locator = locate(&doc, element);
        let reparsed: Locator = locator.to_string().parse().unwrap();
        assert_eq!(resolve(&doc, &reparsed), Ok(element), "{locator}");
    }
}

#[test]
fn test_parse_forms() {
    assert_eq!(
        r#"xpath=//*[@id="a b"]"#.parse::<Locator>(),
        Ok(Locator::Id("a b".to_string()))
    );
    assert_eq!("".parse::<Locator>(), Ok(Locator::Detached));
    assert_eq!(
        "/html/body/div[2]".parse::<Locator>(),
        Ok(Locator::Path(vec![
            PathStep { tag: "html".into(), position: None },
            PathStep { tag: "body".into(), position: None },
            PathStep { tag: "div".into(), position: Some(2) },
        ]))
    );
}

#[test]
fn test_parse_rejects_garbage() {
    for bad in ["html/body", "/html/body/div[0]", "/html//div", "/html/div[x]", r#"//*[@id=""]"#] {
        assert!(
            matches!(bad.parse::<Locator>(), Err(LocatorError::Malformed(_))),
            "{bad}"
        );
    }
}

#[test]
fn test_as_target() {
    let locator = Locator::Id("email".to_string());
    assert_eq!(locator.as_target(), r#"xpath=//*[@id="email"]"#);
}
