use crate::candidates::{Candidate, CandidateSet, CandidateSource};
use crate::config::{ColumnLayout, DisplayOptions};
use crate::error::TandemError;
use crate::session::{InputSession, SessionId};
use crate::text_layout::{LayoutRow, column_count, layout_rows};

#[derive(Debug, Clone)]
pub struct DisplaySurface {
    session: SessionId,
    candidates: CandidateSet,
    rows: Vec<LayoutRow>,
    columns: usize,
}

impl DisplaySurface {
    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn candidate(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    pub fn rows(&self) -> &[LayoutRow] {
        &self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }
}

#[derive(Debug)]
pub struct CandidateDisplay {
    options: DisplayOptions,
    surface: Option<DisplaySurface>,
    width: u16,
}

impl CandidateDisplay {
    pub fn new(options: DisplayOptions) -> Self {
        Self {
            options,
            surface: None,
            width: 80,
        }
    }

    pub fn options(&self) -> &DisplayOptions {
        &self.options
    }

    pub fn is_visible(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&DisplaySurface> {
        self.surface.as_ref()
    }

    pub fn show(
        &mut self,
        session: &InputSession,
        source: &dyn CandidateSource,
        generation: u64,
    ) -> Result<&DisplaySurface, TandemError> {
        let query = session.field().to_string();
        let listing = source.complete(&query, session)?;
        if let Some(preamble) = listing.preamble.as_deref() {
            tracing::trace!(preamble, "dropping listing preamble");
        }
        let set = CandidateSet::new(query, generation, listing.candidates);
        Ok(self.install(session.id(), set))
    }

    pub fn install(&mut self, session: SessionId, candidates: CandidateSet) -> &DisplaySurface {
        let columns = self.columns_for(&candidates);
        let rows = layout_rows(candidates.items(), columns);
        tracing::debug!(
            session = session.0,
            generation = candidates.generation(),
            query = candidates.query(),
            count = candidates.len(),
            reused = self.surface.is_some(),
            "display refreshed"
        );
        self.surface.insert(DisplaySurface {
            session,
            candidates,
            rows,
            columns,
        })
    }

    pub fn hide(&mut self) -> bool {
        self.surface.take().is_some()
    }

    pub fn toggle(
        &mut self,
        session: &InputSession,
        source: &dyn CandidateSource,
        generation: u64,
    ) -> Result<bool, TandemError> {
        if self.hide() {
            return Ok(false);
        }
        self.show(session, source, generation)?;
        Ok(true)
    }

    pub fn set_width(&mut self, width: u16) -> bool {
        if self.width == width {
            return false;
        }
        self.width = width;
        let Some(surface) = self.surface.take() else {
            return false;
        };
        let old_columns = surface.columns;
        self.install(surface.session, surface.candidates);
        self.surface
            .as_ref()
            .is_some_and(|surface| surface.columns != old_columns)
    }

    /// Lines the display wants, capped at half of `viewport_height`. An empty
    /// candidate set still gets one blank line so the surface stays visible.
    pub fn height(&self, viewport_height: u16) -> u16 {
        let Some(surface) = &self.surface else {
            return 0;
        };
        let mode_line = if self.options.hide_mode_line { 0 } else { 1 };
        let body = (surface.rows.len().max(1) as u16).saturating_add(mode_line);
        body.min((viewport_height / 2).max(1))
    }

    fn columns_for(&self, candidates: &CandidateSet) -> usize {
        match self.options.layout {
            ColumnLayout::OneColumn => 1,
            ColumnLayout::MultiColumn => column_count(
                candidates.items(),
                self.width,
                number_width(candidates.len()),
            ),
        }
    }
}

pub fn number_width(count: usize) -> u16 {
    count.max(1).to_string().len() as u16 + 1
}
