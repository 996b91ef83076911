//! # Display Management
//!
//! Plain-text rendering of a [`GameState`], one character per cell.

use crate::{CellKind, ContentData, DelveResult, Door, GameCell, GameState, Vector2};

/// Renders the map, a status line and the latest messages as text.
#[derive(Debug, Clone)]
pub struct AsciiDisplay {
    /// Draw every cell and entity regardless of what the player has seen
    pub reveal_all: bool,
    /// Messages shown under the map
    pub message_count: usize,
}

impl Default for AsciiDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl AsciiDisplay {
    pub fn new() -> Self {
        Self {
            reveal_all: false,
            message_count: 3,
        }
    }

    /// A display that ignores fog of war.
    pub fn revealing() -> Self {
        Self {
            reveal_all: true,
            ..Self::new()
        }
    }

    /// Renders the complete screen: map, status line and recent messages.
    pub fn render(&self, state: &GameState) -> DelveResult<String> {
        let mut out = self.render_map(state)?;
        out.push_str(&self.status_line(state));
        out.push('\n');

        let messages = state.messages();
        let start = messages.len().saturating_sub(self.message_count);
        for message in messages.range(start..) {
            out.push_str(message);
            out.push('\n');
        }
        Ok(out)
    }

    /// One line of text per map row.
    pub fn render_map(&self, state: &GameState) -> DelveResult<String> {
        let map = state.current_map()?;
        let mut out = String::with_capacity(((map.width + 1) * map.height) as usize);
        for y in 0..map.height {
            for x in 0..map.width {
                out.push(self.glyph_at(state, Vector2::new(x, y)).unwrap_or(' '));
            }
            out.push('\n');
        }
        Ok(out)
    }

    /// The character drawn at `pos`, or `None` for cells never seen.
    ///
    /// Visible cells show their topmost entity. Remembered cells only show
    /// entities that are always visible, such as doors and stairs.
    pub fn glyph_at(&self, state: &GameState, pos: Vector2) -> Option<char> {
        let visible = self.reveal_all || state.is_visible(pos);
        if !visible && !state.is_visited(pos) {
            return None;
        }
        let cell = state.current_map().ok()?.get(pos)?;
        let entities = &state.world.entities;

        let top = cell
            .entities
            .iter()
            .filter_map(|id| entities.get_entity(*id).ok())
            .filter(|entity| visible || entity.always_visible)
            .max_by_key(|entity| entity.layer);
        if let Some(entity) = top {
            let open_door = entities.get::<Door>(entity.id).is_some_and(|door| door.open);
            return Some(if open_door { '\'' } else { entity.glyph });
        }

        Some(terrain_glyph(cell, &state.world.content))
    }

    /// Player hit points, turn number and carried items.
    pub fn status_line(&self, state: &GameState) -> String {
        let hp = state
            .player_hp()
            .map(|hp| hp.to_string())
            .unwrap_or_else(|| "?".to_string());
        let mut line = format!(
            "HP: {}  Turn: {}  Items: {}",
            hp,
            state.turn_number,
            state.inventory().len()
        );
        if state.player_dead {
            line.push_str("  [dead]");
        }
        line
    }
}

/// Glyph for the bare terrain of a cell. Walkable cells show their feature
/// when the content pack defines one.
pub fn terrain_glyph(cell: &GameCell, content: &ContentData) -> char {
    match cell.kind {
        CellKind::Void => ' ',
        CellKind::Wall => '#',
        CellKind::Floor | CellKind::Room | CellKind::Corridor => cell
            .feature
            .and_then(|feature| content.feature(feature.name()).ok())
            .map(|def| def.avatar)
            .unwrap_or('.'),
    }
}
