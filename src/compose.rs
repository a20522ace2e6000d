use crate::codec::SourceBundle;

/// Builds the preview document. Field contents are embedded verbatim; the
/// preview frame's sandbox is what isolates them from the host page.
pub fn compose(bundle: &SourceBundle) -> String {
    let SourceBundle {
        markup,
        style,
        script,
    } = bundle;
    let mut doc = String::with_capacity(160 + markup.len() + style.len() + script.len());
    doc.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    doc.push_str("<style>");
    doc.push_str(style);
    doc.push_str("</style>\n</head>\n<body>\n");
    doc.push_str(markup);
    // Module scripts get their own top-level scope on every render.
    doc.push_str("\n<script type=\"module\">");
    doc.push_str(script);
    doc.push_str("</script>\n</body>\n</html>\n");
    doc
}
