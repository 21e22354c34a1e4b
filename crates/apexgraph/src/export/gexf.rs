//! GEXF 1.2 export for Gephi and other graph visualisation tools.
//!
//! Node and edge kinds are exported as attributes so tools can partition and
//! colour by them. Edge ids are positional.

use crate::graph::{GraphSnapshot, REPOSITORY_KEY};
use std::fmt::Write;

const NODE_ATTRIBUTES: [(&str, &str); 3] = [
    ("kind", "string"),
    ("placeholder", "boolean"),
    ("repository", "string"),
];

/// Export a snapshot as a GEXF 1.2 document.
pub fn to_gexf(snapshot: &GraphSnapshot) -> String {
    let mut output = String::new();

    // Header
    output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    output.push_str("<gexf xmlns=\"http://gexf.net/1.2\" version=\"1.2\">\n");
    output.push_str("  <meta>\n    <creator>apexgraph</creator>\n  </meta>\n");
    output.push_str("  <graph mode=\"static\" defaultedgetype=\"directed\">\n");

    output.push_str("    <attributes class=\"node\">\n");
    for (index, (title, kind)) in NODE_ATTRIBUTES.iter().enumerate() {
        let _ = writeln!(
            output,
            "      <attribute id=\"{index}\" title=\"{title}\" type=\"{kind}\"/>"
        );
    }
    output.push_str("    </attributes>\n");
    output.push_str("    <attributes class=\"edge\">\n");
    output.push_str("      <attribute id=\"0\" title=\"kind\" type=\"string\"/>\n");
    output.push_str("    </attributes>\n");

    output.push_str("    <nodes>\n");
    for node in &snapshot.nodes {
        let _ = writeln!(
            output,
            "      <node id=\"{}\" label=\"{}\">",
            escape_xml(node.id.as_str()),
            escape_xml(node.data.label())
        );
        output.push_str("        <attvalues>\n");
        let _ = writeln!(
            output,
            "          <attvalue for=\"0\" value=\"{}\"/>",
            node.kind()
        );
        let _ = writeln!(
            output,
            "          <attvalue for=\"1\" value=\"{}\"/>",
            node.is_placeholder()
        );
        if let Some(repository) = node.metadata.get(REPOSITORY_KEY) {
            let _ = writeln!(
                output,
                "          <attvalue for=\"2\" value=\"{}\"/>",
                escape_xml(repository)
            );
        }
        output.push_str("        </attvalues>\n");
        output.push_str("      </node>\n");
    }
    output.push_str("    </nodes>\n");

    output.push_str("    <edges>\n");
    for (index, edge) in snapshot.edges.iter().enumerate() {
        let _ = writeln!(
            output,
            "      <edge id=\"{index}\" source=\"{}\" target=\"{}\" label=\"{}\">",
            escape_xml(edge.from.as_str()),
            escape_xml(edge.to.as_str()),
            edge.kind
        );
        let _ = writeln!(
            output,
            "        <attvalues>\n          <attvalue for=\"0\" value=\"{}\"/>\n        </attvalues>",
            edge.kind
        );
        output.push_str("      </edge>\n");
    }
    output.push_str("    </edges>\n");

    output.push_str("  </graph>\n</gexf>\n");
    output
}

/// Escape XML special characters in attribute values
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
