use super::{same_set, FieldCandidate, FieldManager, Node, Path};
use tracing::debug;

const NTH_CHILD: &str = "nth-child(";

impl FieldCandidate {
    /// Clears `nth-child` pseudo-classes whose index reaches `min_occurrence`,
    /// since those usually encode the position of an item in a list rather
    /// than its structure. The final node is never touched, nor is the one
    /// above it when `min_occurrence` is 6 or more. Such protected item
    /// nodes are generalized later, when two repetitions get merged.
    pub fn strip_nth_child(&mut self, min_occurrence: usize) {
        let protected = if min_occurrence < 6 { 1 } else { 2 };
        let end = self.path.len().saturating_sub(protected);

        for i in (0..end).rev() {
            let node = &mut self.path[i];
            if node.nth_child().map_or(false, |n| n >= min_occurrence) {
                node.pseudo_classes.retain(|p| !p.starts_with(NTH_CHILD));
                self.strip_index = i;
            }
        }
    }

    /// Path and strip index of the group formed by `self` and `other`, or
    /// `None` when they are not repetitions of the same field.
    ///
    /// Above the final node, two `nth-child` indices that both reach
    /// `min_occurrence` mark repeated items: the pair is merged without its
    /// pseudo-classes and the strip index moves down to it.
    fn merged_path(&self, other: &FieldCandidate, min_occurrence: usize) -> Option<(Path, usize)> {
        if self.text_index != other.text_index
            || self.attr != other.attr
            || self.path.len() != other.path.len()
        {
            return None;
        }

        let last = self.path.len().saturating_sub(1);
        let mut strip_index = self.strip_index.max(other.strip_index);
        let mut nodes = Vec::with_capacity(self.path.len());
        for (i, (a, b)) in self.path.iter().zip(other.path.iter()).enumerate() {
            let compare_pseudo = i > strip_index;
            let node = match merge_nodes(a, b, compare_pseudo) {
                Some(node) => node,
                None if compare_pseudo && i < last && repeated_items(a, b, min_occurrence) => {
                    strip_index = i;
                    merge_nodes(a, b, false)?
                }
                None => return None,
            };
            nodes.push(node);
        }
        Some((Path(nodes), strip_index))
    }

    fn absorb(&mut self, other: FieldCandidate, path: Path, strip_index: usize) {
        self.path = path;
        self.count += other.count;
        self.examples.extend(other.examples);
        self.emission_index = self.emission_index.min(other.emission_index);
        self.strip_index = strip_index;
    }
}

fn repeated_items(a: &Node, b: &Node, min_occurrence: usize) -> bool {
    let large = |n: &Node| n.nth_child().map_or(false, |i| i >= min_occurrence);
    large(a) && large(b)
}

fn merge_nodes(a: &Node, b: &Node, compare_pseudo: bool) -> Option<Node> {
    if a.tag_name != b.tag_name {
        return None;
    }

    let same_pseudo = same_set(&a.pseudo_classes, &b.pseudo_classes);
    if compare_pseudo && !same_pseudo {
        return None;
    }

    let classes: Vec<String> = a
        .classes
        .iter()
        .filter(|c| b.classes.contains(c))
        .cloned()
        .collect();
    if classes.is_empty() && !(a.classes.is_empty() && b.classes.is_empty()) {
        return None;
    }

    Some(Node {
        tag_name: a.tag_name.clone(),
        classes,
        pseudo_classes: if same_pseudo {
            a.pseudo_classes.clone()
        } else {
            vec![]
        },
    })
}

/// Merges candidates that repeat the same logical field across sibling items
/// into groups, accumulating their examples.
///
/// Candidates with the deepest strip index are merged first so that groups
/// get established with the most lenient context; shallower candidates then
/// fold into them. The result is in document order again.
pub fn squash(fields: FieldManager, min_occurrence: usize) -> FieldManager {
    let mut candidates = fields.into_inner();
    let total = candidates.len();

    for candidate in candidates.iter_mut() {
        candidate.strip_nth_child(min_occurrence);
    }
    candidates.sort_by_key(|c| c.strip_index);

    let mut groups: Vec<FieldCandidate> = vec![];
    for candidate in candidates.into_iter().rev() {
        let target = groups
            .iter_mut()
            .find_map(|g| g.merged_path(&candidate, min_occurrence).map(|m| (g, m)));
        match target {
            Some((group, (path, strip_index))) => group.absorb(candidate, path, strip_index),
            None => groups.push(candidate),
        }
    }

    groups.sort_by_key(|g| g.emission_index);
    for group in groups.iter_mut() {
        group.examples.sort_by_key(|e| e.index);
    }

    debug!("Squashed {} candidates into {} groups", total, groups.len());
    groups.into()
}
