// Data Seeder - sample topic graph for the demo binary and integration tests

use tracing::info;

use crate::core::strong_types::TopicId;
use crate::core::topic::LIST_CONTENT_TYPE;
use crate::core::topic_graph::{TopicGraph, BASE_TOPIC_REFERENCE};
use crate::error::AppResult;
use crate::infrastructure::InMemoryTopicRepository;
use crate::schema::registry::{ATTRIBUTES_GROUP, CONTENT_TYPE_DESCRIPTOR, PERMITTED_CONTENT_TYPES};

/// `(key, editor, attributes)` for one attribute descriptor topic.
type AttributeSeed<'a> = (&'a str, &'a str, &'a [(&'a str, &'a str)]);

fn content_type(
    graph: &mut TopicGraph,
    parent: TopicId,
    key: &str,
    attributes: &[AttributeSeed<'_>],
) -> AppResult<TopicId> {
    let id = graph.create_topic(key, CONTENT_TYPE_DESCRIPTOR, Some(parent))?;
    if !attributes.is_empty() {
        let group = graph.create_topic(ATTRIBUTES_GROUP, LIST_CONTENT_TYPE, Some(id))?;
        for (attribute, editor, values) in attributes {
            let attribute_id = graph.create_topic(attribute, editor, Some(group))?;
            for (name, value) in values.iter() {
                graph.set_attribute(attribute_id, name, value)?;
            }
        }
    }
    Ok(id)
}

fn page(
    graph: &mut TopicGraph,
    parent: TopicId,
    key: &str,
    content_type: &str,
    attributes: &[(&str, &str)],
) -> AppResult<TopicId> {
    let id = graph.create_topic(key, content_type, Some(parent))?;
    for (name, value) in attributes {
        graph.set_attribute(id, name, value)?;
    }
    Ok(id)
}

/// Build the sample site: content-type configuration, a `Web` page tree with a
/// page group, a content list, a hidden page, and a category vocabulary.
pub fn seed_sample_graph() -> AppResult<TopicGraph> {
    let mut graph = TopicGraph::new();
    let root = graph.create_topic("Root", "Container", None)?;

    let configuration = graph.create_topic("Configuration", "Container", Some(root))?;
    let types = graph.create_topic("ContentTypes", "Container", Some(configuration))?;
    let container = content_type(&mut graph, types, "Container", &[])?;
    content_type(&mut graph, types, LIST_CONTENT_TYPE, &[])?;
    let page_type = content_type(
        &mut graph,
        types,
        "Page",
        &[
            ("Title", "TextAttributeDescriptor", &[("IsRequired", "1"), ("SortOrder", "1")]),
            ("ShortTitle", "TextAttributeDescriptor", &[]),
            ("MetaKeywords", "TextAttributeDescriptor", &[("DisplayGroup", "Search")]),
            ("Body", "HtmlAttributeDescriptor", &[("IsExtendedAttribute", "1")]),
            ("SortOrder", "NumberAttributeDescriptor", &[("DefaultValue", "0")]),
            ("View", "TextAttributeDescriptor", &[("DefaultValue", "Page")]),
        ],
    )?;
    let page_group_type = content_type(&mut graph, page_type, "PageGroup", &[])?;
    let content_list_type = content_type(
        &mut graph,
        page_type,
        "ContentList",
        &[("View", "TextAttributeDescriptor", &[("DefaultValue", "ContentList")])],
    )?;
    let content_item_type = content_type(
        &mut graph,
        types,
        "ContentItem",
        &[
            ("Description", "TextAttributeDescriptor", &[("IsRequired", "1")]),
            ("LearnMoreUrl", "UrlAttributeDescriptor", &[]),
            ("Category", "TextAttributeDescriptor", &[]),
        ],
    )?;
    content_type(&mut graph, types, "Category", &[])?;
    graph.relate(page_type, PERMITTED_CONTENT_TYPES, page_type)?;
    graph.relate(page_type, PERMITTED_CONTENT_TYPES, page_group_type)?;
    graph.relate(page_type, PERMITTED_CONTENT_TYPES, content_list_type)?;
    graph.relate(content_list_type, PERMITTED_CONTENT_TYPES, content_item_type)?;
    graph.relate(container, PERMITTED_CONTENT_TYPES, page_type)?;

    let categories = graph.create_topic("Categories", "Container", Some(root))?;
    let announcements = page(&mut graph, categories, "Announcements", "Category", &[])?;
    let releases = page(&mut graph, categories, "Releases", "Category", &[])?;

    let web = page(
        &mut graph,
        root,
        "Web",
        "Page",
        &[("Title", "Home"), ("MetaKeywords", "ontopic, content")],
    )?;
    let about = page(&mut graph, web, "About", "Page", &[("Title", "About Us"), ("SortOrder", "1")])?;
    page(&mut graph, about, "Team", "Page", &[("Title", "Our Team")])?;
    let contact = page(&mut graph, web, "Contact", "Page", &[("Title", "Contact"), ("SortOrder", "2")])?;
    graph.relate(about, "Related", contact)?;

    let services = page(&mut graph, web, "Services", "PageGroup", &[("Title", "Services")])?;
    let consulting = page(
        &mut graph,
        services,
        "Consulting",
        "Page",
        &[("Title", "Consulting"), ("Body", "<p>Architecture reviews.</p>")],
    )?;
    let training = page(&mut graph, services, "Training", "Page", &[("Title", "Training")])?;
    graph.set_reference(training, BASE_TOPIC_REFERENCE, Some(consulting))?;

    let news = page(&mut graph, web, "News", "ContentList", &[("Title", "News")])?;
    let items = graph.create_topic("ContentItems", LIST_CONTENT_TYPE, Some(news))?;
    page(
        &mut graph,
        items,
        "Launch",
        "ContentItem",
        &[("Description", "The site is live."), ("Category", "Announcements")],
    )?;
    page(
        &mut graph,
        items,
        "Version2",
        "ContentItem",
        &[("Description", "Version 2 is out."), ("Category", "Releases")],
    )?;
    graph.relate(news, "Categories", announcements)?;
    graph.relate(news, "Categories", releases)?;

    let archive = page(&mut graph, web, "Archive", "Page", &[("Title", "Archive")])?;
    graph.set_hidden(archive, true)?;

    info!("Seeded sample graph with {} topics", graph.len());
    Ok(graph)
}

pub fn seed_repository() -> AppResult<InMemoryTopicRepository> {
    Ok(InMemoryTopicRepository::new(seed_sample_graph()?))
}
