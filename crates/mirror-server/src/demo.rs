// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Demo UI served to every new session: a shell with a label and a
//! read-only combo. Picking an item echoes it into the label.

use mirror_protocol::json;
use mirror_render::combo::{self, READ_ONLY};
use mirror_render::{event, Application, Event, ObjectGraph, ObjectId};

const COLORS: [&str; 4] = ["red", "green", "blue", "black"];

/// The demo application.
#[derive(Debug, Default)]
pub struct Demo {
    label: Option<ObjectId>,
    combo: Option<ObjectId>,
}

impl Application for Demo {
    fn start(&mut self, graph: &mut ObjectGraph) -> anyhow::Result<()> {
        let shell = graph.create("Shell", None, &["TITLE"])?;
        graph
            .object_mut(&shell)?
            .set_property("text", json!("Mirror demo"));

        let label = graph.create("Label", Some(&shell), &[])?;
        graph
            .object_mut(&label)?
            .set_property("text", json!("Pick a color"));

        let id = graph.create("Combo", Some(&shell), &[READ_ONLY])?;
        let picker = graph.object_mut(&id)?;
        for color in COLORS {
            combo::add(picker, color);
        }
        picker.events_mut().hook(event::SELECTION);

        self.label = Some(label);
        self.combo = Some(id);
        Ok(())
    }

    fn handle_event(&mut self, graph: &mut ObjectGraph, event: &Event) -> anyhow::Result<()> {
        if self.combo.as_deref() != Some(event.target.as_str()) {
            return Ok(());
        }
        let picked = combo::text(graph.object(&event.target)?);
        if let Some(label) = &self.label {
            graph
                .object_mut(label)?
                .set_property("text", json!(format!("Picked {picked}")));
        }
        Ok(())
    }
}
