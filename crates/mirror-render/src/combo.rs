// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Drop-down combo: widget operations and its renderer.
//!
//! The selection is rendered when its index changed, and also when the text
//! of a read-only combo changed behind an unchanged index: after
//! `remove_all`, `add("b")`, `select(0)` the index is still `0` but the
//! client shows a different item.

use mirror_protocol::{Properties, Value};
use serde_json::json;

use crate::error::RenderError;
use crate::event;
use crate::graph::RemoteObject;
use crate::renderer::{
    control_properties, render_listeners, render_properties, PropertySpec, RenderContext, Renderer,
};
use crate::snapshot::Snapshot;
use crate::writer::OperationWriter;

/// Text limit meaning "unlimited".
pub const LIMIT: i64 = i32::MAX as i64;

/// Style flag that makes the text field read-only.
pub const READ_ONLY: &str = "READ_ONLY";

const ITEMS: &str = "items";
const SELECTION_INDEX: &str = "selectionIndex";
const TEXT: &str = "text";
const TEXT_SELECTION: &str = "textSelection";
const TEXT_LIMIT: &str = "textLimit";
const VISIBLE_ITEM_COUNT: &str = "visibleItemCount";
const LIST_VISIBLE: &str = "listVisible";
const EDITABLE: &str = "editable";

/// Items currently in the drop-down list.
pub fn items(combo: &RemoteObject) -> Vec<String> {
    combo
        .property(ITEMS)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

/// Selected index, `-1` when nothing is selected.
pub fn selection_index(combo: &RemoteObject) -> i64 {
    combo
        .property(SELECTION_INDEX)
        .and_then(Value::as_i64)
        .unwrap_or(-1)
}

/// Text shown in the combo field.
pub fn text(combo: &RemoteObject) -> String {
    combo
        .property(TEXT)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

/// Whether the user can type into the field.
pub fn is_editable(combo: &RemoteObject) -> bool {
    !combo.has_style(READ_ONLY)
}

/// Append an item.
pub fn add(combo: &mut RemoteObject, item: &str) {
    let mut list = items(combo);
    list.push(item.to_owned());
    combo.set_property(ITEMS, json!(list));
}

/// Remove every item, clearing selection and text.
pub fn remove_all(combo: &mut RemoteObject) {
    combo.set_property(ITEMS, json!([]));
    combo.set_property(SELECTION_INDEX, json!(-1));
    combo.set_property(TEXT, json!(""));
    combo.set_property(TEXT_SELECTION, json!([0, 0]));
}

/// Select the item at `index`; out-of-range indices are ignored.
pub fn select(combo: &mut RemoteObject, index: i64) {
    let list = items(combo);
    let Some(item) = usize::try_from(index).ok().and_then(|i| list.get(i)) else {
        return;
    };
    let item = item.clone();
    combo.set_property(SELECTION_INDEX, json!(index));
    combo.set_property(TEXT, json!(item));
    combo.set_property(TEXT_SELECTION, json!([0, 0]));
}

/// Set the field text.
///
/// A read-only combo can only show one of its items: matching text selects
/// that item, anything else clears the selection.
pub fn set_text(combo: &mut RemoteObject, value: &str) {
    if is_editable(combo) {
        let index = items(combo)
            .iter()
            .position(|item| item == value)
            .map_or(-1, index_of);
        combo.set_property(SELECTION_INDEX, json!(index));
        combo.set_property(TEXT, json!(value));
        return;
    }
    match items(combo).iter().position(|item| item == value) {
        Some(index) => select(combo, index_of(index)),
        None => {
            combo.set_property(SELECTION_INDEX, json!(-1));
            combo.set_property(TEXT, json!(""));
        }
    }
}

/// Select the text range `[start, end)` in the field.
pub fn set_text_selection(combo: &mut RemoteObject, start: i64, end: i64) {
    let len = index_of(text(combo).chars().count());
    let start = start.clamp(0, len);
    let end = end.clamp(start, len);
    combo.set_property(TEXT_SELECTION, json!([start, end]));
}

/// Maximum number of characters, [`LIMIT`] when unlimited.
pub fn set_text_limit(combo: &mut RemoteObject, limit: i64) {
    let limit = if limit <= 0 { LIMIT } else { limit };
    combo.set_property(TEXT_LIMIT, json!(limit));
}

/// Number of items visible without scrolling.
pub fn set_visible_item_count(combo: &mut RemoteObject, count: i64) {
    if count >= 0 {
        combo.set_property(VISIBLE_ITEM_COUNT, json!(count));
    }
}

/// Open or close the drop-down list.
pub fn set_list_visible(combo: &mut RemoteObject, visible: bool) {
    combo.set_property(LIST_VISIBLE, json!(visible));
}

fn index_of(position: usize) -> i64 {
    i64::try_from(position).unwrap_or(i64::MAX)
}

fn text_selection(combo: &RemoteObject) -> (i64, i64) {
    combo
        .property(TEXT_SELECTION)
        .and_then(Value::as_array)
        .and_then(|pair| Some((pair.first()?.as_i64()?, pair.get(1)?.as_i64()?)))
        .unwrap_or((0, 0))
}

fn int(properties: &Properties, name: &str, target: &str) -> Result<Option<i64>, RenderError> {
    match properties.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| RenderError::Rule {
            target: target.to_owned(),
            reason: format!("{name} is not an integer: {value}"),
        }),
    }
}

/// Renderer for `Combo` widgets.
#[derive(Debug, Clone)]
pub struct ComboRenderer {
    control: Vec<PropertySpec>,
    combo: Vec<PropertySpec>,
    all: Vec<PropertySpec>,
}

impl Default for ComboRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ComboRenderer {
    /// Combo renderer with the common control properties.
    pub fn new() -> Self {
        let control = control_properties();
        let combo = vec![
            PropertySpec::new(VISIBLE_ITEM_COUNT, json!(5)),
            PropertySpec::new(LIST_VISIBLE, json!(false)).writable(),
            PropertySpec::new(ITEMS, json!([])),
        ];
        let mut all = control.clone();
        all.extend(combo.iter().cloned());
        all.extend([
            PropertySpec::new(SELECTION_INDEX, json!(-1)).writable(),
            PropertySpec::new(EDITABLE, json!(true)),
            PropertySpec::new(TEXT, json!("")).writable(),
            PropertySpec::new(TEXT_SELECTION, json!([0, 0])).writable(),
            PropertySpec::new(TEXT_LIMIT, json!(LIMIT)),
        ]);
        Self { control, combo, all }
    }

    fn render_selection(&self, ctx: &RenderContext<'_>, writer: &mut OperationWriter<'_>) {
        let object = ctx.object();
        let index = json!(selection_index(object));
        let selection_changed = ctx.has_changed(SELECTION_INDEX, &index, Some(&json!(-1)));
        let text_changed =
            !is_editable(object) && ctx.has_changed(TEXT, &json!(text(object)), Some(&json!("")));
        if selection_changed || text_changed {
            writer.set(object.id(), SELECTION_INDEX, index);
        }
    }

    fn render_text(&self, ctx: &RenderContext<'_>, writer: &mut OperationWriter<'_>) {
        let object = ctx.object();
        if is_editable(object) || selection_index(object) == -1 {
            let current = json!(text(object));
            if ctx.has_changed(TEXT, &current, Some(&json!(""))) {
                writer.set(object.id(), TEXT, current);
            }
        }
    }

    fn render_text_selection(&self, ctx: &RenderContext<'_>, writer: &mut OperationWriter<'_>) {
        let object = ctx.object();
        let (start, end) = text_selection(object);
        if !ctx.has_changed(TEXT_SELECTION, &json!([start, end]), Some(&json!([0, 0]))) {
            return;
        }
        let visible = self.value(object, "visibility").as_bool().unwrap_or(true);
        if ctx.options().gate_text_selection_on_visibility && !visible {
            return;
        }
        writer.set(object.id(), "selection", json!([start, end - start]));
    }

    fn render_text_limit(&self, ctx: &RenderContext<'_>, writer: &mut OperationWriter<'_>) {
        let object = ctx.object();
        let current = self.value(object, TEXT_LIMIT);
        if ctx.has_changed(TEXT_LIMIT, &current, Some(&json!(LIMIT))) {
            let rendered = match current.as_i64() {
                Some(LIMIT) => Value::Null,
                _ => current,
            };
            writer.set(object.id(), TEXT_LIMIT, rendered);
        }
    }
}

impl Renderer for ComboRenderer {
    fn client_type(&self) -> &str {
        "rwt.widgets.Combo"
    }

    fn properties(&self) -> &[PropertySpec] {
        &self.all
    }

    fn listeners(&self) -> &[&'static str] {
        &[event::SELECTION, event::MODIFY, event::FOCUS, event::CONTROL]
    }

    fn value(&self, object: &RemoteObject, name: &str) -> Value {
        match name {
            EDITABLE => json!(is_editable(object)),
            SELECTION_INDEX => json!(selection_index(object)),
            TEXT => json!(text(object)),
            TEXT_SELECTION => {
                let (start, end) = text_selection(object);
                json!([start, end])
            }
            _ => object
                .property(name)
                .cloned()
                .or_else(|| {
                    self.all
                        .iter()
                        .find(|spec| spec.name == name)
                        .and_then(|spec| spec.default.clone())
                })
                .unwrap_or(Value::Null),
        }
    }

    fn listener_state(&self, object: &RemoteObject, kind: &str) -> bool {
        match kind {
            event::MODIFY => {
                object.events().hooks(event::MODIFY) || object.events().hooks(event::VERIFY)
            }
            _ => object.events().hooks(kind),
        }
    }

    fn read_data(
        &self,
        object: &mut RemoteObject,
        properties: &Properties,
        snapshot: &mut Snapshot,
    ) -> Result<(), RenderError> {
        let index = int(properties, SELECTION_INDEX, object.id())?;
        let start = int(properties, "selectionStart", object.id())?;
        let length = int(properties, "selectionLength", object.id())?;

        if let Some(index) = index {
            select(object, index);
        }
        if let Some(visible) = properties.get(LIST_VISIBLE).and_then(Value::as_bool) {
            set_list_visible(object, visible);
        }
        if let Some(value) = properties.get(TEXT).and_then(Value::as_str) {
            set_text(object, value);
        }
        if start.is_some() || length.is_some() {
            let start = start.unwrap_or(0);
            set_text_selection(object, start, start.saturating_add(length.unwrap_or(0)));
        }

        for name in [SELECTION_INDEX, TEXT, TEXT_SELECTION, LIST_VISIBLE] {
            snapshot.preserve(name, self.value(object, name));
        }
        Ok(())
    }

    fn render_changes(
        &self,
        ctx: &RenderContext<'_>,
        writer: &mut OperationWriter<'_>,
    ) -> Result<(), RenderError> {
        render_properties(self, ctx, writer, &self.control);
        render_properties(self, ctx, writer, &self.combo);
        self.render_selection(ctx, writer);
        render_properties(
            self,
            ctx,
            writer,
            &[PropertySpec::new(EDITABLE, json!(true))],
        );
        self.render_text(ctx, writer);
        self.render_text_selection(ctx, writer);
        self.render_text_limit(ctx, writer);
        render_listeners(self, ctx, writer, self.listeners());
        Ok(())
    }
}
