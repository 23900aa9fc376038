//! Execution engine: threads the source image through the active path.

use image::RgbaImage;
use log::{debug, warn};

use crate::error::LibraryError;
use crate::loader::image::thumbnail;
use crate::model::project::graph::GraphStore;
use crate::model::project::graph_analysis::ActivePath;

/// Runs every intermediate node of `path` over a copy of the source image.
///
/// Returns `None` when the path does not reach Output or no image is loaded.
pub fn execute(graph: &GraphStore, path: &ActivePath) -> Result<Option<RgbaImage>, LibraryError> {
    if !path.is_complete() {
        return Ok(None);
    }
    let Some(source) = graph.source_image() else {
        return Ok(None);
    };

    let mut image = source.clone();
    for &id in path.intermediate() {
        let node = graph
            .node(id)
            .ok_or_else(|| LibraryError::node_not_found(id.to_string()))?;
        image = node.kind.run(&image, &node.settings)?;
    }
    Ok(Some(image))
}

/// Executes `path` and stores the result and its preview in the Output node.
///
/// The Output node is cleared whenever nothing can be rendered, including on error.
pub fn render<'a>(
    graph: &'a mut GraphStore,
    path: &ActivePath,
    preview_max: u32,
) -> Result<Option<&'a RgbaImage>, LibraryError> {
    match execute(graph, path) {
        Ok(Some(image)) => {
            let preview = thumbnail(&image, preview_max);
            debug!(
                "Rendered {}x{} through {} node(s)",
                image.width(),
                image.height(),
                path.intermediate().len()
            );
            graph.set_output(image, preview);
            Ok(graph.output_image())
        }
        Ok(None) => {
            graph.clear_output();
            Ok(None)
        }
        Err(e) => {
            warn!("Render failed: {}", e);
            graph.clear_output();
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::project::graph_analysis::resolve_path;
    use crate::model::project::graph_node::Position;
    use crate::model::project::property::SettingValue;
    use crate::plugin::ModuleKind;
    use image::Rgba;

    fn chain(graph: &mut GraphStore, nodes: &[crate::model::project::arena::NodeId]) {
        for pair in nodes.windows(2) {
            let source = graph.node(pair[0]).unwrap().output_port.unwrap();
            let target = graph.node(pair[1]).unwrap().input_port.unwrap();
            graph.add_link(source, target).unwrap();
        }
    }

    fn graph_with_image(width: u32, height: u32) -> GraphStore {
        let mut graph = GraphStore::new();
        graph.set_source_image(RgbaImage::from_pixel(width, height, Rgba([90, 120, 150, 255])), None);
        graph
    }

    #[test]
    fn test_incomplete_path_renders_nothing() {
        let mut graph = graph_with_image(4, 4);
        let path = resolve_path(&graph);
        assert!(render(&mut graph, &path, 450).unwrap().is_none());
        assert!(graph.output_image().is_none());
        assert!(graph.output_preview().is_none());
    }

    #[test]
    fn test_missing_source_renders_nothing() {
        let mut graph = GraphStore::new();
        let (input, output) = (graph.input_id(), graph.output_id());
        chain(&mut graph, &[input, output]);
        let path = resolve_path(&graph);
        assert!(execute(&graph, &path).unwrap().is_none());
    }

    #[test]
    fn test_direct_link_passes_image_through() {
        let mut graph = graph_with_image(6, 3);
        let (input, output) = (graph.input_id(), graph.output_id());
        chain(&mut graph, &[input, output]);
        let path = resolve_path(&graph);
        let out = render(&mut graph, &path, 450).unwrap().unwrap().clone();
        assert_eq!(&out, graph.source_image().unwrap());
    }

    #[test]
    fn test_transforms_apply_in_path_order() {
        let mut graph = graph_with_image(100, 80);
        let (input, output) = (graph.input_id(), graph.output_id());
        let resize = graph.add_node(ModuleKind::Resize, Position::default()).unwrap();
        let crop = graph.add_node(ModuleKind::Crop, Position::default()).unwrap();
        graph.set_setting(resize, "width", SettingValue::from(50)).unwrap();
        graph.set_setting(resize, "keep_aspect", SettingValue::from(false)).unwrap();
        graph.set_setting(crop, "left", SettingValue::from(10)).unwrap();
        chain(&mut graph, &[input, resize, crop, output]);

        let path = resolve_path(&graph);
        let out = execute(&graph, &path).unwrap().unwrap();
        assert_eq!(out.dimensions(), (40, 80));
    }

    #[test]
    fn test_preview_is_bounded() {
        let mut graph = graph_with_image(900, 300);
        let (input, output) = (graph.input_id(), graph.output_id());
        chain(&mut graph, &[input, output]);
        let path = resolve_path(&graph);
        render(&mut graph, &path, 450).unwrap();
        assert_eq!(graph.output_image().unwrap().dimensions(), (900, 300));
        assert_eq!(graph.output_preview().unwrap().dimensions(), (450, 150));
    }

    #[test]
    fn test_unlinking_clears_previous_output() {
        let mut graph = graph_with_image(4, 4);
        let (input, output) = (graph.input_id(), graph.output_id());
        chain(&mut graph, &[input, output]);
        let path = resolve_path(&graph);
        render(&mut graph, &path, 450).unwrap();
        assert!(graph.output_image().is_some());

        let link = graph.links().next().unwrap().id;
        graph.remove_link(link);
        let path = resolve_path(&graph);
        render(&mut graph, &path, 450).unwrap();
        assert!(graph.output_image().is_none());
    }
}
