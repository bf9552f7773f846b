//! Session controller - owns the loaded image and render parameters.
//!
//! A session moves through three states:
//!
//! - `Empty` - nothing loaded yet
//! - `Loaded` - pixels extracted, nothing painted
//! - `Rendered` - an averaged grid has been painted onto the surface
//!
//! Every parameter change is processed synchronously and triggers exactly one
//! render pass. Block size changes go through the shared [`AverageCache`];
//! padding, style and jitter changes reuse the current averaged grid.
//!
//! # Structure
//!
//! - [`events`] - UI events and x-ray state
//! - [`error`] - Error types for session operations

mod error;
mod events;

pub use error::SessionError;
pub use events::{EventOutcome, UiEvent, XrayState, DEFAULT_XRAY_RADIUS};

use rand::Rng;
use std::sync::Arc;

use crate::cache::{AverageCache, ImageId};
use crate::loader::{DecodedImage, LoadError};
use crate::pixels::{average_blocks, AveragedGrid, BlockSize, PixelGrid};
use crate::render::{self, RenderParameters, RenderStats, RevealRegion, Style, StyleSelection, Surface};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Loaded,
    Rendered,
}

/// Handle for one image load request. Only the newest ticket is honoured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    source: ImageId,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> &ImageId {
        &self.source
    }
}

/// Result of delivering a load completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The image replaced the session's pixels.
    Applied,
    /// A newer request exists, or this ticket already fired; ignored.
    Superseded,
}

#[derive(Debug)]
struct LoadedImage {
    id: ImageId,
    pixels: PixelGrid,
}

/// Interactive pixelation session over a drawing surface.
pub struct Session<S, R> {
    surface: S,
    rng: R,
    cache: Arc<AverageCache>,
    image: Option<LoadedImage>,
    params: RenderParameters,
    averaged: Option<(BlockSize, Arc<AveragedGrid>)>,
    state: SessionState,
    xray: XrayState,
    generation: u64,
    pending: Option<u64>,
    last_render: Option<RenderStats>,
}

impl<S: Surface, R: Rng> Session<S, R> {
    /// Create an empty session painting onto `surface`.
    ///
    /// # Arguments
    /// * `surface` - Drawing surface; resized to the image on load
    /// * `rng` - Jitter source
    /// * `cache` - Averaging cache, possibly shared with other sessions
    pub fn new(surface: S, rng: R, cache: Arc<AverageCache>) -> Self {
        Self {
            surface,
            rng,
            cache,
            image: None,
            params: RenderParameters::for_canvas(0, 0),
            averaged: None,
            state: SessionState::Empty,
            xray: XrayState::default(),
            generation: 0,
            pending: None,
            last_render: None,
        }
    }

    /// Override the x-ray reveal radius.
    pub fn with_xray_radius(mut self, radius: f64) -> Self {
        self.xray.radius = radius;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn params(&self) -> &RenderParameters {
        &self.params
    }

    pub fn image_id(&self) -> Option<&ImageId> {
        self.image.as_ref().map(|i| &i.id)
    }

    pub fn pixels(&self) -> Option<&PixelGrid> {
        self.image.as_ref().map(|i| &i.pixels)
    }

    /// Averaged grid used by the last render pass.
    pub fn averaged(&self) -> Option<&AveragedGrid> {
        self.averaged.as_ref().map(|(_, grid)| grid.as_ref())
    }

    pub fn last_render(&self) -> Option<RenderStats> {
        self.last_render
    }

    pub fn xray(&self) -> &XrayState {
        &self.xray
    }

    pub fn cache(&self) -> &Arc<AverageCache> {
        &self.cache
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Replace the current image with raw RGBA pixels.
    ///
    /// Resets render parameters to their defaults and sizes the canvas to the
    /// image. Supersedes any pending asynchronous load. On error the session
    /// is left exactly as it was.
    pub fn load_image(
        &mut self,
        bytes: &[u8],
        width: u32,
        height: u32,
        id: ImageId,
    ) -> Result<(), SessionError> {
        let pixels = PixelGrid::from_rgba(bytes, width, height)?;
        self.generation += 1;
        self.pending = None;
        self.install(id, pixels, width, height);
        Ok(())
    }

    /// Register a new asynchronous load request, superseding earlier ones.
    pub fn begin_load(&mut self, source: ImageId) -> LoadTicket {
        self.generation += 1;
        self.pending = Some(self.generation);
        log::debug!("Load #{} requested: {}", self.generation, source);
        LoadTicket {
            generation: self.generation,
            source,
        }
    }

    /// Deliver the completion of a load request.
    ///
    /// Only the most recent ticket is applied, and only once. A failed decode
    /// or malformed buffer for the current ticket is returned as an error and
    /// leaves the previous image in place.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<DecodedImage, LoadError>,
    ) -> Result<LoadOutcome, SessionError> {
        if self.pending != Some(ticket.generation) {
            log::debug!(
                "Ignoring stale load #{} ({}), current is #{}",
                ticket.generation,
                ticket.source,
                self.generation
            );
            return Ok(LoadOutcome::Superseded);
        }
        self.pending = None;

        let decoded = result.inspect_err(|e| log::warn!("Load of {} failed: {}", ticket.source, e))?;
        let pixels = PixelGrid::from_rgba(&decoded.bytes, decoded.width, decoded.height)?;
        self.install(decoded.source_id, pixels, decoded.width, decoded.height);
        Ok(LoadOutcome::Applied)
    }

    fn install(&mut self, id: ImageId, pixels: PixelGrid, width: u32, height: u32) {
        log::info!("Loaded {} ({}x{})", id, width, height);
        self.surface.resize(width, height);
        self.image = Some(LoadedImage { id, pixels });
        self.params = RenderParameters::for_canvas(width, height);
        self.averaged = None;
        self.last_render = None;
        self.state = SessionState::Loaded;
    }

    /// Render with the current parameters.
    pub fn render(&mut self) -> Result<RenderStats, SessionError> {
        self.render_pass()
    }

    /// Replace the render parameters wholesale and render once.
    ///
    /// The canvas size always tracks the loaded image and cannot be changed
    /// through here.
    pub fn update_parameters<F>(&mut self, update: F) -> Result<RenderStats, SessionError>
    where
        F: FnOnce(RenderParameters) -> RenderParameters,
    {
        if self.image.is_none() {
            return Err(SessionError::NoImage);
        }
        let next = update(self.params);
        self.params = RenderParameters {
            canvas_width: self.params.canvas_width,
            canvas_height: self.params.canvas_height,
            ..next
        };
        self.render_pass()
    }

    pub fn set_block_size(&mut self, block_size: BlockSize) -> Result<RenderStats, SessionError> {
        self.update_parameters(|p| RenderParameters { block_size, ..p })
    }

    pub fn set_padding(&mut self, padding: u32) -> Result<RenderStats, SessionError> {
        self.update_parameters(|p| RenderParameters { padding, ..p })
    }

    pub fn set_style(&mut self, style: Style) -> Result<RenderStats, SessionError> {
        self.apply_selection(style.selection())
    }

    pub fn set_jitter(&mut self, jitter: bool) -> Result<RenderStats, SessionError> {
        self.update_parameters(|p| RenderParameters { jitter, ..p })
    }

    fn apply_selection(&mut self, selection: StyleSelection) -> Result<RenderStats, SessionError> {
        self.update_parameters(|p| RenderParameters {
            shape: selection.shape,
            jitter: selection.jitter.unwrap_or(p.jitter),
            ..p
        })
    }

    /// Enable or disable the x-ray reveal.
    pub fn set_xray(&mut self, enabled: bool) -> Option<RevealRegion> {
        self.xray.enabled = enabled;
        self.xray.region()
    }

    /// Track the pointer; returns the region to reveal while x-ray is on.
    pub fn pointer_moved(&mut self, x: f64, y: f64) -> Option<RevealRegion> {
        self.xray.pointer = Some((x, y));
        self.xray.region()
    }

    /// Dispatch a UI event.
    pub fn handle(&mut self, event: UiEvent) -> Result<EventOutcome, SessionError> {
        match event {
            UiEvent::BlockSizeChanged(size) => {
                let block = BlockSize::new(size)?;
                self.set_block_size(block).map(EventOutcome::Rendered)
            }
            UiEvent::PaddingChanged(padding) => self.set_padding(padding).map(EventOutcome::Rendered),
            UiEvent::StyleChanged(id) => self
                .apply_selection(Style::resolve(&id))
                .map(EventOutcome::Rendered),
            UiEvent::JitterToggled(on) => self.set_jitter(on).map(EventOutcome::Rendered),
            UiEvent::XrayToggled(on) => Ok(EventOutcome::Reveal(self.set_xray(on))),
            UiEvent::PointerMoved { x, y } => Ok(EventOutcome::Reveal(self.pointer_moved(x, y))),
        }
    }

    fn render_pass(&mut self) -> Result<RenderStats, SessionError> {
        let image = self.image.as_ref().ok_or(SessionError::NoImage)?;
        let block = self.params.block_size;

        let current = match &self.averaged {
            Some((cached_block, grid)) if *cached_block == block => Some(Arc::clone(grid)),
            _ => None,
        };
        let grid = match current {
            Some(grid) => grid,
            None => {
                let grid = self
                    .cache
                    .get_or_compute(image.id.clone(), block, || average_blocks(&image.pixels, block));
                self.averaged = Some((block, Arc::clone(&grid)));
                grid
            }
        };

        let stats = render::render(&mut self.surface, &grid, &self.params, &mut self.rng);
        self.last_render = Some(stats);
        self.state = SessionState::Rendered;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::Color;
    use crate::render::{RecordingSurface, Shape};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn session() -> Session<RecordingSurface, StdRng> {
        Session::new(
            RecordingSurface::default(),
            StdRng::seed_from_u64(42),
            AverageCache::shared(),
        )
    }

    fn white(width: u32, height: u32) -> Vec<u8> {
        vec![255; (width * height * 4) as usize]
    }

    #[test]
    fn test_new_session_is_empty() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Empty);
        assert!(matches!(s.set_padding(2), Err(SessionError::NoImage)));
        assert!(matches!(s.render(), Err(SessionError::NoImage)));
    }

    #[test]
    fn test_load_resets_parameters_and_resizes() {
        let mut s = session();
        s.load_image(&white(8, 6), 8, 6, ImageId::new("a")).unwrap();
        s.set_padding(3).unwrap();

        s.load_image(&white(4, 4), 4, 4, ImageId::new("b")).unwrap();
        assert_eq!(s.state(), SessionState::Loaded);
        assert_eq!(*s.params(), RenderParameters::for_canvas(4, 4));
        assert_eq!(s.surface().width(), 4);
    }

    #[test]
    fn test_malformed_load_keeps_previous_image() {
        let mut s = session();
        s.load_image(&white(4, 4), 4, 4, ImageId::new("a")).unwrap();
        s.render().unwrap();

        let err = s.load_image(&[1, 2, 3], 1, 1, ImageId::new("bad"));
        assert!(matches!(err, Err(SessionError::Malformed(_))));
        assert_eq!(s.state(), SessionState::Rendered);
        assert_eq!(s.image_id(), Some(&ImageId::new("a")));
    }

    #[test]
    fn test_style_change_updates_shape_and_jitter() {
        let mut s = session();
        s.load_image(&white(4, 4), 4, 4, ImageId::new("a")).unwrap();

        s.handle(UiEvent::StyleChanged("square".into())).unwrap();
        assert_eq!(s.params().shape, Shape::Square);
        assert!(s.params().jitter);

        s.handle(UiEvent::StyleChanged("nonsense".into())).unwrap();
        assert_eq!(s.params().shape, Shape::Circle);
        assert!(!s.params().jitter);

        s.set_style(Style::Scatter).unwrap();
        assert!(s.params().jitter);
    }

    #[test]
    fn test_zero_block_size_event_is_rejected() {
        let mut s = session();
        s.load_image(&white(4, 4), 4, 4, ImageId::new("a")).unwrap();
        assert!(matches!(
            s.handle(UiEvent::BlockSizeChanged(0)),
            Err(SessionError::InvalidBlockSize(_))
        ));
        assert_eq!(s.params().block_size, BlockSize::DEFAULT);
    }

    #[test]
    fn test_xray_events() {
        let mut s = session().with_xray_radius(20.0);
        assert_eq!(
            s.handle(UiEvent::PointerMoved { x: 1.0, y: 2.0 }).unwrap(),
            EventOutcome::Reveal(None)
        );
        let outcome = s.handle(UiEvent::XrayToggled(true)).unwrap();
        assert_eq!(
            outcome,
            EventOutcome::Reveal(Some(RevealRegion {
                x: 1.0,
                y: 2.0,
                radius: 20.0
            }))
        );
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut s = session();
        let first = s.begin_load(ImageId::new("first"));
        let second = s.begin_load(ImageId::new("second"));

        let decoded = DecodedImage {
            bytes: vec![0, 0, 0, 255],
            width: 1,
            height: 1,
            source_id: ImageId::new("first"),
        };
        assert_eq!(s.finish_load(first, Ok(decoded)).unwrap(), LoadOutcome::Superseded);
        assert_eq!(s.state(), SessionState::Empty);

        let decoded = DecodedImage {
            bytes: vec![10, 20, 30, 255],
            width: 1,
            height: 1,
            source_id: ImageId::new("second"),
        };
        assert_eq!(
            s.finish_load(second.clone(), Ok(decoded.clone())).unwrap(),
            LoadOutcome::Applied
        );
        assert_eq!(s.pixels().unwrap().get(0, 0), Some(Color::rgba(10, 20, 30, 255)));

        // A ticket fires at most once
        assert_eq!(s.finish_load(second, Ok(decoded)).unwrap(), LoadOutcome::Superseded);
    }
}
