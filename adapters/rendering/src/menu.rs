//! Pause menu contract and the stock avatar picker.

use overworld_core::{AvatarId, PixelPoint, PlayerSettings, TILE_SIZE};
use tracing::info;

use crate::{Color, DrawTarget, FrameInput, SheetRef};

/// Menu shown in place of player updates while the overworld is paused.
pub trait PauseMenu {
    /// Handles one paused frame: reacts to `input`, may rewrite the shared
    /// `settings`, and draws itself on top of the map.
    fn display(
        &mut self,
        input: &FrameInput,
        settings: &mut PlayerSettings,
        target: &mut dyn DrawTarget,
    );
}

const PANEL_ORIGIN: PixelPoint = PixelPoint::new(TILE_SIZE, TILE_SIZE);
const PANEL_WIDTH: i32 = TILE_SIZE * 8;
const LINE_HEIGHT: i32 = 24;
const TEXT_SIZE: f32 = 22.0;

/// Pause menu listing the registered avatars; left and right cycle the choice.
#[derive(Clone, Debug)]
pub struct AvatarMenu {
    avatars: Vec<AvatarId>,
    panel: Color,
    text: Color,
}

impl AvatarMenu {
    /// Creates a menu offering the provided identities in order.
    #[must_use]
    pub fn new(avatars: Vec<AvatarId>) -> Self {
        Self {
            avatars,
            panel: Color::new(0.05, 0.05, 0.1, 0.85),
            text: Color::from_rgb_u8(0xd0, 0xd0, 0xd0),
        }
    }

    /// Identities offered by the menu.
    #[must_use]
    pub fn avatars(&self) -> &[AvatarId] {
        &self.avatars
    }

    fn cycle(&self, current: &AvatarId, forward: bool) -> Option<&AvatarId> {
        let len = self.avatars.len();
        if len == 0 {
            return None;
        }
        let next = match self.avatars.iter().position(|avatar| avatar == current) {
            Some(index) if forward => (index + 1) % len,
            Some(index) => (index + len - 1) % len,
            None => 0,
        };
        self.avatars.get(next)
    }
}

impl PauseMenu for AvatarMenu {
    fn display(
        &mut self,
        input: &FrameInput,
        settings: &mut PlayerSettings,
        target: &mut dyn DrawTarget,
    ) {
        if input.menu_next != input.menu_previous {
            if let Some(choice) = self.cycle(&settings.avatar, input.menu_next) {
                info!(avatar = %choice, "avatar selected in pause menu");
                settings.avatar = choice.clone();
            }
        }

        let rows = i32::try_from(self.avatars.len()).unwrap_or(i32::MAX);
        let height = LINE_HEIGHT
            .saturating_mul(rows.saturating_add(3))
            .saturating_add(TILE_SIZE);
        target.draw_panel(PANEL_ORIGIN, PANEL_WIDTH, height, self.panel);

        let left = PANEL_ORIGIN.x + 12;
        let mut baseline = PANEL_ORIGIN.y + LINE_HEIGHT;
        target.draw_text("Paused", PixelPoint::new(left, baseline), TEXT_SIZE, self.text);

        for avatar in &self.avatars {
            baseline += LINE_HEIGHT;
            let (marker, color) = if *avatar == settings.avatar {
                ("> ", self.text.lighten(0.8))
            } else {
                ("  ", self.text)
            };
            target.draw_text(
                &format!("{marker}{avatar}"),
                PixelPoint::new(left, baseline),
                TEXT_SIZE,
                color,
            );
        }

        baseline += LINE_HEIGHT;
        target.draw_image(
            SheetRef::Avatar(&settings.avatar),
            0,
            PixelPoint::new(left, baseline),
        );
        baseline += TILE_SIZE + LINE_HEIGHT;
        target.draw_text(
            "Left/Right: avatar  Q: resume",
            PixelPoint::new(left, baseline),
            TEXT_SIZE * 0.75,
            self.text,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        images: Vec<(String, usize)>,
        texts: Vec<String>,
        panels: usize,
    }

    impl DrawTarget for Recorder {
        fn draw_image(&mut self, sheet: SheetRef<'_>, index: usize, _position: PixelPoint) {
            self.images.push((format!("{sheet:?}"), index));
        }

        fn draw_panel(&mut self, _origin: PixelPoint, _width: i32, _height: i32, _color: Color) {
            self.panels += 1;
        }

        fn draw_text(&mut self, text: &str, _position: PixelPoint, _size: f32, _color: Color) {
            self.texts.push(text.to_owned());
        }
    }

    fn menu() -> AvatarMenu {
        AvatarMenu::new(vec![
            AvatarId::new("knight"),
            AvatarId::new("wizard"),
            AvatarId::new("rogue"),
        ])
    }

    fn press(next: bool, previous: bool) -> FrameInput {
        FrameInput {
            menu_next: next,
            menu_previous: previous,
            ..FrameInput::default()
        }
    }

    #[test]
    fn selection_wraps_in_both_directions() {
        let mut menu = menu();
        let mut settings = PlayerSettings::new(AvatarId::new("knight"));
        let mut target = Recorder::default();

        menu.display(&press(false, true), &mut settings, &mut target);
        assert_eq!(settings.avatar, AvatarId::new("rogue"));

        menu.display(&press(true, false), &mut settings, &mut target);
        menu.display(&press(true, false), &mut settings, &mut target);
        assert_eq!(settings.avatar, AvatarId::new("wizard"));
    }

    #[test]
    fn idle_or_conflicting_input_keeps_the_selection() {
        let mut menu = menu();
        let mut settings = PlayerSettings::new(AvatarId::new("wizard"));
        let mut target = Recorder::default();

        menu.display(&FrameInput::default(), &mut settings, &mut target);
        menu.display(&press(true, true), &mut settings, &mut target);

        assert_eq!(settings.avatar, AvatarId::new("wizard"));
    }

    #[test]
    fn unlisted_identity_jumps_to_the_first_entry() {
        let mut menu = menu();
        let mut settings = PlayerSettings::new(AvatarId::new("ghost"));

        menu.display(&press(true, false), &mut settings, &mut Recorder::default());

        assert_eq!(settings.avatar, AvatarId::new("knight"));
    }

    #[test]
    fn panel_lists_every_avatar_and_previews_the_selection() {
        let mut menu = menu();
        let mut settings = PlayerSettings::new(AvatarId::new("wizard"));
        let mut target = Recorder::default();

        menu.display(&FrameInput::default(), &mut settings, &mut target);

        assert_eq!(target.panels, 1);
        assert!(target.texts.contains(&"> wizard".to_owned()));
        assert!(target.texts.contains(&"  knight".to_owned()));
        assert_eq!(target.images.len(), 1);
        assert_eq!(target.images[0].1, 0);
    }

    #[test]
    fn empty_menu_changes_nothing() {
        let mut menu = AvatarMenu::new(Vec::new());
        let mut settings = PlayerSettings::new(AvatarId::new("knight"));

        menu.display(&press(true, false), &mut settings, &mut Recorder::default());

        assert_eq!(settings.avatar, AvatarId::new("knight"));
    }
}
