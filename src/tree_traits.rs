use termtree::Tree;
use tracing::instrument;

use crate::application::Picker;
use crate::domain::LocationNode;

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

fn marker(picker: &Picker, node: &LocationNode) -> &'static str {
    if !node.is_branch {
        if picker.selected() == Some(&node.id) {
            "[x]"
        } else {
            "[ ]"
        }
    } else if picker.is_loading(&node.id) {
        "..."
    } else if picker.is_expanded(&node.id) {
        "-"
    } else {
        "+"
    }
}

fn render_node(picker: &Picker, node: &LocationNode) -> Tree<String> {
    let mut tree = Tree::new(format!("{} {} ({})", marker(picker, node), node.label, node.id));
    if picker.is_expanded(&node.id) {
        for child in picker.forest().children(&node.id) {
            tree.push(render_node(picker, child));
        }
    }
    tree
}

// Only expanded branches show their children, as in the picker itself
impl TreeNodeConvert for Picker {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        if self.forest().is_empty() {
            return Tree::new("Empty tree".to_string());
        }
        let mut tree = Tree::new(format!("locations for {}", self.asset()));
        for root in self.forest().roots() {
            tree.push(render_node(self, root));
        }
        tree
    }
}
