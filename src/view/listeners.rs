//! Dispatch-stage listeners that shape the controller result into the
//! root view model.

use super::ViewModel;
use crate::error::Result;
use crate::event::{ActionResult, MvcEvent};

/// Turn `Data` and empty results into view models.
pub fn create_view_model(event: &mut MvcEvent) -> Result<Option<ActionResult>> {
    match event.take_result() {
        Some(ActionResult::Data(variables)) => {
            event.set_result(ActionResult::Model(ViewModel::new().with_variables(variables)))
        }
        Some(ActionResult::Empty) | None => event.set_result(ActionResult::Model(ViewModel::new())),
        Some(other) => event.set_result(other),
    }
    Ok(None)
}

/// Give a template-less model the `controller/action` template.
pub fn inject_template(event: &mut MvcEvent) -> Result<Option<ActionResult>> {
    let Some(route_match) = event.route_match() else {
        return Ok(None);
    };
    let Some(controller) = route_match.param("controller") else {
        return Ok(None);
    };
    let template = format!(
        "{}/{}",
        controller_segment(controller),
        inflect(route_match.param_or("action", "index"))
    );

    if let Some(ActionResult::Model(model)) = event.result_mut() {
        if !model.has_template() {
            model.set_template(template);
        }
    }
    Ok(None)
}

/// Nest the result model in the layout, or replace the layout when terminal.
pub fn inject_view_model(event: &mut MvcEvent) -> Result<Option<ActionResult>> {
    let Some(model) = event.result().and_then(ActionResult::as_model).cloned() else {
        return Ok(None);
    };

    if model.is_terminal() {
        event.set_view_model(model);
    } else {
        event.view_model_mut().add_child(model);
    }
    Ok(None)
}

/// `Admin\AlbumController` → `album`.
fn controller_segment(controller: &str) -> String {
    let name = controller
        .rsplit(['\\', '/', ':'])
        .next()
        .unwrap_or(controller);
    let name = name.strip_suffix("Controller").unwrap_or(name);
    inflect(name)
}

/// `listAlbums` → `list-albums`.
fn inflect(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('-') {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch == '_' {
            out.push('-');
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::ServiceLocator;
    use crate::router::RouteMatch;
    use axum::body::Bytes;
    use axum::http::Request;
    use serde_json::{Map, Value};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn event_for(controller: &str, action: &str) -> MvcEvent {
        let request = Request::builder().uri("/").body(Bytes::new()).unwrap();
        let mut event = MvcEvent::new(request, Arc::new(ServiceLocator::new()));
        event.set_route_match(Some(RouteMatch::new(
            "test",
            HashMap::from([
                ("controller".to_string(), controller.to_string()),
                ("action".to_string(), action.to_string()),
            ]),
        )));
        event
    }

    #[test]
    fn test_inflection() {
        assert_eq!(controller_segment("Admin\\AlbumController"), "album");
        assert_eq!(controller_segment("album"), "album");
        assert_eq!(inflect("listAlbums"), "list-albums");
        assert_eq!(inflect("edit_track"), "edit-track");
    }

    #[test]
    fn test_data_becomes_model_with_template() {
        let mut event = event_for("AlbumController", "listAll");
        let mut data = Map::new();
        data.insert("count".to_string(), Value::from(2));
        event.set_result(ActionResult::Data(data));

        create_view_model(&mut event).unwrap();
        inject_template(&mut event).unwrap();

        let model = event.result().and_then(ActionResult::as_model).unwrap();
        assert_eq!(model.template(), "album/list-all");
        assert_eq!(model.variable("count"), Some(&Value::from(2)));
    }

    #[test]
    fn test_explicit_template_kept() {
        let mut event = event_for("album", "index");
        event.set_result(ActionResult::Model(
            ViewModel::new().with_template("custom/page"),
        ));
        inject_template(&mut event).unwrap();
        assert_eq!(
            event.result().and_then(ActionResult::as_model).unwrap().template(),
            "custom/page"
        );
    }

    #[test]
    fn test_inject_child_or_replace() {
        let mut event = event_for("album", "index");
        event.set_result(ActionResult::Model(ViewModel::new().with_template("a")));
        inject_view_model(&mut event).unwrap();
        assert_eq!(event.view_model().children().len(), 1);

        event.set_result(ActionResult::Model(ViewModel::json()));
        inject_view_model(&mut event).unwrap();
        assert!(event.view_model().is_terminal());
        assert!(!event.view_model().has_children());
    }
}
