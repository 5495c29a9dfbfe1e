/// The control surface a plugin can mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    PlayButton,
    VolumeSlider,
    VolumeLabel,
    ProgressBar,
    TimeDisplay,
    Canvas,
}

/// One piece of markup a plugin places into the component's scope.
///
/// `id` is the idempotency key: re-adding a fragment with an id that is
/// already mounted replaces the mounted one in place instead of
/// duplicating it.
#[derive(Debug, Clone)]
pub struct MarkupFragment {
    pub id: String,
    pub class: String,
    pub kind: ControlKind,
    pub text: Option<String>,
    /// Generic numeric state: volume fill fraction, progress percent, ...
    pub value: f32,
    /// Generic discrete state: "playing" / "paused", ...
    pub state: Option<String>,
}

impl MarkupFragment {
    pub fn new(id: &str, class: &str, kind: ControlKind) -> Self {
        Self {
            id: id.to_string(),
            class: class.to_string(),
            kind,
            text: None,
            value: 0.0,
            state: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MountOptions {
    /// Insertion point inside the component scope, e.g. ".container .controls".
    pub selector: String,
}

impl MountOptions {
    pub fn at(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
        }
    }
}

#[derive(Debug)]
struct MountedNode {
    selector: String,
    fragment: MarkupFragment,
}

#[derive(Debug)]
struct StyleSheet {
    owner: String,
    css: String,
}

/// The component's isolated markup/style scope. Nothing in here leaks into
/// the host; the presentation layer reads the mounted nodes in mount order
/// and draws only the controls that are actually present.
#[derive(Debug, Default)]
pub struct MarkupScope {
    nodes: Vec<MountedNode>,
    styles: Vec<StyleSheet>,
}

impl MarkupScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a fragment, replacing any fragment with the same id in place
    /// (position in the mount order is preserved on replace).
    pub fn add_markup(&mut self, fragment: MarkupFragment, options: MountOptions) {
        match self.nodes.iter_mut().find(|n| n.fragment.id == fragment.id) {
            Some(node) => {
                node.selector = options.selector;
                node.fragment = fragment;
            }
            None => self.nodes.push(MountedNode {
                selector: options.selector,
                fragment,
            }),
        }
    }

    pub fn remove_markup(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.fragment.id != id);
        before != self.nodes.len()
    }

    /// Append or replace the stylesheet contributed by `owner`. Keyed by
    /// owner so a re-run plugin cannot stack duplicate rules.
    pub fn add_styles(&mut self, owner: &str, css: &str) {
        match self.styles.iter_mut().find(|s| s.owner == owner) {
            Some(sheet) => sheet.css = css.to_string(),
            None => self.styles.push(StyleSheet {
                owner: owner.to_string(),
                css: css.to_string(),
            }),
        }
    }

    pub fn node(&self, id: &str) -> Option<&MarkupFragment> {
        self.nodes
            .iter()
            .find(|n| n.fragment.id == id)
            .map(|n| &n.fragment)
    }

    /// Mutate a mounted fragment in place; no-op when absent.
    pub fn update_node(&mut self, id: &str, f: impl FnOnce(&mut MarkupFragment)) {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.fragment.id == id) {
            f(&mut node.fragment);
        }
    }

    /// Mounted fragments in mount order.
    pub fn nodes(&self) -> impl Iterator<Item = &MarkupFragment> {
        self.nodes.iter().map(|n| &n.fragment)
    }

    pub fn count(&self, id: &str) -> usize {
        self.nodes.iter().filter(|n| n.fragment.id == id).count()
    }

    pub fn selector_of(&self, id: &str) -> Option<&str> {
        self.nodes
            .iter()
            .find(|n| n.fragment.id == id)
            .map(|n| n.selector.as_str())
    }

    /// Concatenated style scope, in contribution order.
    pub fn styles(&self) -> String {
        self.styles
            .iter()
            .map(|s| s.css.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_markup_replaces_by_id() {
        let mut scope = MarkupScope::new();
        let mut fragment = MarkupFragment::new("play-button", "play-button", ControlKind::PlayButton);
        scope.add_markup(fragment.clone(), MountOptions::at(".controls"));

        fragment.state = Some("playing".to_string());
        scope.add_markup(fragment, MountOptions::at(".controls"));

        assert_eq!(scope.count("play-button"), 1);
        assert_eq!(
            scope.node("play-button").unwrap().state.as_deref(),
            Some("playing")
        );
    }

    #[test]
    fn test_styles_keyed_by_owner() {
        let mut scope = MarkupScope::new();
        scope.add_styles("volume", ".volume-slider { width: 100px; }");
        scope.add_styles("volume", ".volume-slider { width: 120px; }");
        scope.add_styles("play", ".play-button { border: 0; }");

        let css = scope.styles();
        assert_eq!(css.matches(".volume-slider").count(), 1);
        assert!(css.contains("120px"));
        assert!(css.contains(".play-button"));
    }

    #[test]
    fn test_remove_markup() {
        let mut scope = MarkupScope::new();
        scope.add_markup(
            MarkupFragment::new("canvas", "visualizer", ControlKind::Canvas),
            MountOptions::default(),
        );
        assert!(scope.remove_markup("canvas"));
        assert!(!scope.remove_markup("canvas"));
        assert_eq!(scope.count("canvas"), 0);
    }
}
