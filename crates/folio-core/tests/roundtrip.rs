use folio_core::{
    AnnotationRecord, ConvertOptions, MarkupEvent, Recognizer, SerializeOptions, convert,
    read_events, serialize,
};

const SOURCES: &[&str] = &[
    "<body><p>plain</p></body>",
    "<body><pb n=\"1r\"/><p>a &amp; b &lt; c &gt; d</p><pb n=\"1v\"/><p>\"quoted\" 'single'</p></body>",
    "<body><p title=\"say &quot;hi&quot;\" data-x=\"a&#9;b&#10;c\">line&#13;feed</p></body>",
    "<body>\n  <p>x<lb/>y<br/>z<span></span></p>\n</body>",
    "<div><cb n=\"1\"/><p><mark>tobi</mark> <hi rend=\"italic\"><mark>co<pb/>xi</mark></hi></p><cb n=\"2\"/></div>",
    "<body><p>]]&gt; and \u{00e1}\u{017f} q\u{0303}</p></body>",
];

fn reserialize(html: &str) -> Result<String, Box<dyn std::error::Error>> {
    let events = read_events(html, &Recognizer::none())?;
    Ok(serialize(&events, &SerializeOptions::default())?)
}

#[test]
fn serialized_output_reparses_to_the_same_markup() -> Result<(), Box<dyn std::error::Error>> {
    let records = [
        AnnotationRecord::keyed("tobi", "<table><caption>tobi</caption></table>"),
        AnnotationRecord::keyed("coxi", "<b>&amp;</b> 'bird'"),
    ];
    for source in SOURCES {
        let first = convert(source, &records, &ConvertOptions::default())?.html;
        let second = reserialize(&first)?;
        assert_eq!(first, second, "output changed after re-reading {:?}", source);
    }
    Ok(())
}

#[test]
fn void_elements_reparse_without_content() -> Result<(), Box<dyn std::error::Error>> {
    let html = convert("<p>a<br/>b</p>", &[], &ConvertOptions::default())?.html;
    assert!(html.contains("a<br/>b"));
    let events = read_events(&html, &Recognizer::none())?;
    let br = events
        .iter()
        .position(|event| *event == MarkupEvent::open("br"))
        .ok_or("missing br")?;
    assert_eq!(events[br + 1], MarkupEvent::close("br"));
    Ok(())
}

#[test]
fn control_characters_survive_as_references() -> Result<(), Box<dyn std::error::Error>> {
    let events = vec![
        MarkupEvent::open_with("p", &[("data-x", "tab\there")]),
        MarkupEvent::text("cr\rhere"),
        MarkupEvent::close("p"),
    ];
    let html = serialize(&events, &SerializeOptions::default())?;
    assert_eq!(html, "<p data-x=\"tab&#9;here\">cr&#13;here</p>");
    assert_eq!(read_events(&html, &Recognizer::none())?, events);
    Ok(())
}
