use tracing::info;

use crate::survey::Component;

/// Copy of `tree` without errored components (whole subtrees) and errored instructions.
///
/// Returns `None` when the root itself carries errors. Order and codes of everything that
/// survives are preserved, and sanitizing a sanitized tree is a no-op.
pub fn sanitize(tree: &Component) -> Option<Component> {
    if tree.has_errors() {
        info!("component {} dropped with {} error(s)", tree.code, tree.errors.len());
        return None;
    }

    let instructions = tree
        .instructions
        .iter()
        .filter(|instruction| {
            if instruction.has_errors() {
                info!(
                    "instruction {}.{} dropped with {} error(s)",
                    tree.code,
                    instruction.code,
                    instruction.errors.len()
                );
            }
            !instruction.has_errors()
        })
        .cloned()
        .collect();

    Some(Component {
        code: tree.code.clone(),
        instructions,
        children: tree.children.iter().filter_map(sanitize).collect(),
        errors: Vec::new(),
    })
}
