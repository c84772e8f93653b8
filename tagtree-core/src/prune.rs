//! Removal of groups left without tests after filtering.
use tracing::*;

use crate::spec::Group;

/// Drop every descendant group that ends up with neither child groups nor
/// tests, innermost groups first. The root itself is always kept.
pub fn prune(mut spec: Group) -> Group {
    spec.groups = std::mem::take(&mut spec.groups)
        .into_iter()
        .map(prune)
        .filter(|group| {
            if group.is_empty() {
                debug!("pruning empty group {:?} from {:?}", group.name, spec.name);
            }
            !group.is_empty()
        })
        .collect();
    spec
}
