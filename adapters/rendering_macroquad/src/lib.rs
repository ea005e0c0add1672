#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for the overworld.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! Sprite sheets are loaded once the window exists and sliced into square
//! source cells; every image is drawn scaled to one map tile.

mod sprites;

use anyhow::Result;
use macroquad::{
    input::{is_key_down, is_key_pressed, KeyCode},
    shapes::draw_rectangle,
    text::draw_text,
};
use overworld_core::{DirectionalInput, PixelPoint};
use overworld_rendering::{
    Color, DrawTarget, FrameInput, Presentation, RenderingBackend, SheetRef,
};
use std::{
    collections::VecDeque,
    sync::mpsc,
    time::{Duration, Instant},
};
use tracing::{debug, info};

use self::sprites::SheetAtlas;

#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Escape` quits the frame loop.
    quit_requested: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape),
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct FrameBreakdown {
    frame: Duration,
    update: Duration,
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    update_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_update: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, breakdown: FrameBreakdown) -> Option<FpsMetrics> {
        self.elapsed += breakdown.frame;
        self.frames = self.frames.saturating_add(1);
        self.update_accum += breakdown.update;

        self.frame_times.push_back(breakdown.frame);
        self.window_duration += breakdown.frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            let Some(removed) = self.frame_times.pop_front() else {
                break;
            };
            self.window_duration = self.window_duration.saturating_sub(removed);
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames;
        let update_accum = self.update_accum;
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.update_accum = Duration::ZERO;
        if seconds <= f32::EPSILON || frames == 0 {
            return None;
        }

        let per_second = frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        Some(FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_update: update_accum / frames,
        })
    }
}

/// Draw target issuing macroquad calls for the current frame.
struct MacroquadTarget<'a> {
    atlas: &'a mut SheetAtlas,
}

impl DrawTarget for MacroquadTarget<'_> {
    fn draw_image(&mut self, sheet: SheetRef<'_>, index: usize, position: PixelPoint) {
        self.atlas.draw(sheet, index, position);
    }

    fn draw_panel(&mut self, origin: PixelPoint, width: i32, height: i32, color: Color) {
        draw_rectangle(
            origin.x as f32,
            origin.y as f32,
            width as f32,
            height as f32,
            to_macroquad_color(color),
        );
    }

    fn draw_text(&mut self, text: &str, position: PixelPoint, size: f32, color: Color) {
        let _ = draw_text(
            text,
            position.x as f32,
            position.y as f32,
            size,
            to_macroquad_color(color),
        );
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_frame: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut dyn DrawTarget) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let window_width = presentation.screen_width();
        let window_height = presentation.screen_height();
        let Presentation {
            window_title,
            clear_color,
            source_tile_size,
            sheets,
            ..
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width,
            window_height,
            window_resizable: false,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        let (atlas_init_sender, atlas_init_receiver) = mpsc::channel::<Result<()>>();

        macroquad::Window::from_config(config, async move {
            let mut atlas = match SheetAtlas::from_sources(&sheets, source_tile_size) {
                Ok(atlas) => atlas,
                Err(error) => {
                    let _ = atlas_init_sender.send(Err(error));
                    return;
                }
            };
            debug!(sheets = atlas.len(), "sprite sheets loaded");
            let _ = atlas_init_sender.send(Ok(()));

            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    info!("quit requested");
                    break;
                }

                macroquad::window::clear_background(background);

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let input = gather_frame_input(is_key_down, is_key_pressed);

                let update_start = Instant::now();
                let mut target = MacroquadTarget { atlas: &mut atlas };
                update_frame(frame_dt, input, &mut target);
                let update = update_start.elapsed();

                let fps_metrics = fps_counter.record_frame(FrameBreakdown {
                    frame: frame_dt,
                    update,
                });
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        trailing_ten_seconds,
                        avg_update,
                    }) = fps_metrics
                    {
                        info!(
                            fps = %format!("{per_second:.2}"),
                            trailing_fps = %format!("{trailing_ten_seconds:.2}"),
                            update_ms = %format!("{:.2}", avg_update.as_secs_f64() * 1_000.0),
                            "frame timing"
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        atlas_init_receiver.recv().unwrap_or_else(|_| Ok(()))?;

        Ok(())
    }
}

/// Maps keyboard state to the frame input consumed by the overworld.
///
/// Arrows and WASD steer, `Q` toggles pause, `R` resets, and left or right
/// also step the pause menu.
fn gather_frame_input(
    held: impl Fn(KeyCode) -> bool,
    pressed: impl Fn(KeyCode) -> bool,
) -> FrameInput {
    let directions = DirectionalInput {
        up: held(KeyCode::Up) || held(KeyCode::W),
        down: held(KeyCode::Down) || held(KeyCode::S),
        left: held(KeyCode::Left) || held(KeyCode::A),
        right: held(KeyCode::Right) || held(KeyCode::D),
    };
    FrameInput {
        directions,
        toggle_pause: pressed(KeyCode::Q),
        reset: pressed(KeyCode::R),
        menu_next: pressed(KeyCode::Right) || pressed(KeyCode::D),
        menu_previous: pressed(KeyCode::Left) || pressed(KeyCode::A),
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_wasd_steer_the_player() {
        let input = gather_frame_input(|key| matches!(key, KeyCode::W | KeyCode::Right), |_| false);

        assert_eq!(
            input.directions,
            DirectionalInput {
                up: true,
                right: true,
                ..DirectionalInput::NONE
            }
        );
        assert!(!input.toggle_pause);
        assert!(!input.menu_next);
    }

    #[test]
    fn presses_map_to_pause_reset_and_menu_steps() {
        let input = gather_frame_input(
            |_| false,
            |key| matches!(key, KeyCode::Q | KeyCode::R | KeyCode::A),
        );

        assert!(input.toggle_pause);
        assert!(input.reset);
        assert!(input.menu_previous);
        assert!(!input.menu_next);
        assert_eq!(input.directions, DirectionalInput::NONE);
    }

    #[test]
    fn colors_convert_channel_for_channel() {
        let color = to_macroquad_color(Color::new(0.1, 0.2, 0.3, 0.4));

        assert_eq!(
            (color.r, color.g, color.b, color.a),
            (0.1, 0.2, 0.3, 0.4)
        );
    }

    #[test]
    fn fps_counter_reports_average_frames_per_second() {
        let mut counter = FpsCounter::default();
        let frame = |millis| FrameBreakdown {
            frame: Duration::from_millis(millis),
            update: Duration::from_millis(2),
        };
        assert!(counter.record_frame(frame(250)).is_none());
        assert!(counter.record_frame(frame(250)).is_none());
        assert!(counter.record_frame(frame(250)).is_none());

        let metrics = counter
            .record_frame(frame(250))
            .expect("should report FPS after one second of samples");
        assert!((metrics.per_second - 4.0).abs() <= 1e-3);
        assert!((metrics.trailing_ten_seconds - 4.0).abs() <= 1e-3);
        assert_eq!(metrics.avg_update, Duration::from_millis(2));
        assert!(counter.record_frame(frame(250)).is_none());
    }

    #[test]
    fn fps_counter_tracks_trailing_ten_second_average() {
        let mut counter = FpsCounter::default();
        let frame = |millis| FrameBreakdown {
            frame: Duration::from_millis(millis),
            ..FrameBreakdown::default()
        };

        for _ in 0..10 {
            for sample in 0..5 {
                let metrics = counter.record_frame(frame(200));
                if sample == 4 {
                    let metrics = metrics.expect("should report every second");
                    assert!((metrics.per_second - 5.0).abs() <= 1e-3);
                } else {
                    assert!(metrics.is_none());
                }
            }
        }

        for sample in 0..10 {
            let metrics = counter.record_frame(frame(100));
            if sample == 9 {
                let metrics = metrics.expect("should report every second");
                assert!((metrics.per_second - 10.0).abs() <= 1e-3);
                assert!((metrics.trailing_ten_seconds - 5.5).abs() <= 1e-3);
            } else {
                assert!(metrics.is_none());
            }
        }
    }
}
