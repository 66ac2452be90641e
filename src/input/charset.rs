//! Recursive charset annotation of a decoded message tree.

use tracing::debug;

use crate::encoding::Codec;
use crate::model::message::StructuredMessage;

/// Outcome of a propagation walk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PropagationReport {
    /// Nodes that received a charset.
    pub assigned: usize,
    /// Nodes that could not take one.
    pub skipped: usize,
}

/// Give every node a charset: its own declared charset if present, else the
/// one resolved for its parent, starting from `encoding` at the root.
///
/// Labels no codec knows are still assigned; such nodes decode with the
/// nearest registered ancestor's codec. A node that rejects the assignment
/// is skipped; its children and siblings are still visited.
pub fn propagate(message: &mut StructuredMessage, encoding: &str) -> PropagationReport {
    let mut report = PropagationReport::default();
    let codec = Codec::for_label(encoding).unwrap_or(Codec::Utf8);
    visit(message, encoding, codec, &mut report);
    debug!(
        assigned = report.assigned,
        skipped = report.skipped,
        "Charset propagation finished"
    );
    report
}

fn visit(
    node: &mut StructuredMessage,
    inherited: &str,
    inherited_codec: Codec,
    report: &mut PropagationReport,
) {
    let resolved = node
        .declared_charset()
        .unwrap_or_else(|| inherited.to_string());

    let codec = Codec::for_label(&resolved).unwrap_or_else(|| {
        debug!(charset = %resolved, "Unregistered charset, decoding with the inherited codec");
        inherited_codec
    });

    match node.set_charset(&resolved, inherited_codec) {
        Ok(_) => report.assigned += 1,
        Err(e) => {
            report.skipped += 1;
            debug!(charset = %resolved, error = %e, "Skipping charset assignment");
        }
    }

    for child in node.parts_mut() {
        visit(child, &resolved, codec, report);
    }
}
