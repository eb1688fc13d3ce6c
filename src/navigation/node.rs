// Navigation Node - one mapped topic in a navigation tree

use once_cell::sync::OnceCell;
use serde::ser::Serializer;
use serde::Serialize;
use std::sync::Arc;

use crate::framework::view_model::ViewModel;

/// A mapped topic whose children are assigned at most once.
#[derive(Debug, Serialize)]
pub struct NavigationNode {
    #[serde(flatten)]
    pub model: Arc<ViewModel>,
    #[serde(serialize_with = "serialize_children")]
    children: OnceCell<Vec<Arc<NavigationNode>>>,
}

impl NavigationNode {
    pub fn new(model: Arc<ViewModel>) -> Self {
        Self {
            model,
            children: OnceCell::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.model.key
    }

    pub fn title(&self) -> &str {
        self.model.title()
    }

    /// Children in the order they were assembled, or empty when never populated.
    pub fn children(&self) -> &[Arc<NavigationNode>] {
        self.children.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_populated(&self) -> bool {
        self.children.get().is_some()
    }

    /// Assign the children. Returns `false`, discarding `children`, when another
    /// caller populated the node first.
    pub fn populate(&self, children: Vec<Arc<NavigationNode>>) -> bool {
        self.children.set(children).is_ok()
    }

    pub fn child(&self, key: &str) -> Option<&Arc<NavigationNode>> {
        self.children()
            .iter()
            .find(|child| child.key().eq_ignore_ascii_case(key))
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }
}

fn serialize_children<S: Serializer>(
    children: &OnceCell<Vec<Arc<NavigationNode>>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let children: &[Arc<NavigationNode>] = children.get().map(Vec::as_slice).unwrap_or(&[]);
    serializer.collect_seq(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::topic_graph::TopicGraph;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn node(key: &str) -> Arc<NavigationNode> {
        let mut graph = TopicGraph::new();
        let id = graph.create_topic(key, "Page", None).unwrap();
        let graph = Arc::new(graph);
        let topic = graph.topic(id).unwrap();
        Arc::new(NavigationNode::new(Arc::new(ViewModel::shape(
            &topic,
            "NavigationTopicViewModel",
        ))))
    }

    #[test]
    fn test_populate_once() {
        let parent = node("Web");
        assert!(parent.children().is_empty());
        assert!(!parent.is_populated());

        assert!(parent.populate(vec![node("About")]));
        assert!(!parent.populate(vec![node("Contact"), node("Careers")]));
        assert_eq!(parent.children().len(), 1);
        assert!(parent.child("about").is_some());
        assert_eq!(parent.node_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_populate_has_one_winner() {
        let parent = node("Web");
        let winners = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for i in 0..16 {
            let parent = Arc::clone(&parent);
            let winners = Arc::clone(&winners);
            handles.push(tokio::spawn(async move {
                let children = (0..=i).map(|n| node(&format!("Child{}", n))).collect();
                if parent.populate(children) {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert!(parent.is_populated());
    }

    #[test]
    fn test_serializes_flat_with_children() {
        let parent = node("Web");
        parent.populate(vec![node("About")]);
        let json = serde_json::to_value(parent.as_ref()).unwrap();
        assert_eq!(json["key"], "Web");
        assert_eq!(json["children"][0]["key"], "About");
        assert!(json["children"][0]["children"].as_array().unwrap().is_empty());
    }
}
