//! Turns the raw lines of a hunk into display rows.
//!
//! The processor is a small state machine over context/add/remove runs.
//! Lines are buffered per side and flushed on state changes, which is where
//! equal-sized remove/add blocks are paired for word diffing. Each flushed
//! line is tokenized with the grammar state of its own side so multi-line
//! constructs highlight correctly on both sides of a change.

pub mod grammar;
pub mod pool;
pub mod segments;


use crate::application::header_only::is_header_only_hunk;
use crate::domain::{
    DiffError, Hunk, InnerPatchLineType, LineSegment, ParsedPatch, PatchLine, PatchLineType,
    RenderOptions, is_no_newline_sentinel,
};
use crate::infra::syntax::{HighlightProvider, HighlightToken, Language};
use grammar::GrammarSlots;
use segments::{Span, build_segments, whole_line, word_diff_spans};
use serde::Serialize;

pub use pool::{LineProcessorPool, PooledProcessor};

/// Which run of a hunk a raw line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineSide {
    Context,
    Add,
    Remove,
}

impl LineSide {
    pub fn classify(raw: &str) -> Self {
        match raw.as_bytes().first() {
            Some(b'+') => LineSide::Add,
            Some(b'-') => LineSide::Remove,
            _ => LineSide::Context,
        }
    }

    fn row_kind(self) -> PatchLineType {
        match self {
            LineSide::Context => PatchLineType::Context,
            LineSide::Add => PatchLineType::Add,
            LineSide::Remove => PatchLineType::Remove,
        }
    }
}

/// Everything a processor needs to know about the file a hunk belongs to.
pub struct HunkContext<'a, H> {
    pub highlighter: &'a H,
    pub language: &'a Language,
    pub options: &'a RenderOptions,
    /// The diffed file is itself a patch; rows get an inner marker type.
    pub nested_patch: bool,
}

#[derive(Debug, Clone)]
struct BufferedLine {
    text: String,
    old_line_no: Option<u32>,
    new_line_no: Option<u32>,
    no_newline: bool,
}

enum Coloring {
    Disabled,
    Tokens(Vec<HighlightToken>),
    Failed,
}

/// A row before post-processing.
struct DraftRow {
    line: PatchLine,
    no_newline: bool,
}

impl DraftRow {
    fn finish(self) -> PatchLine {
        let mut line = self.line;
        if self.no_newline {
            if line
                .content
                .last()
                .is_some_and(|segment| segment.icon.is_none() && segment.text_str().is_empty())
            {
                line.content.pop();
            }
            line.content.push(LineSegment::no_newline_icon());
        }

        let blank = match line.content.as_slice() {
            [] => true,
            [only] => only.icon.is_none() && only.text_str().is_empty(),
            _ => false,
        };
        if blank {
            line.content.clear();
            line.line_break = true;
        }
        line
    }
}

/// Reusable per-hunk state machine. See [`LineProcessorPool`] for reuse.
pub struct LineProcessor<S> {
    state: LineSide,
    context: Vec<BufferedLine>,
    added: Vec<BufferedLine>,
    removed: Vec<BufferedLine>,
    rows: Vec<DraftRow>,
    grammar: GrammarSlots<S>,
    old_line_no: u32,
    new_line_no: u32,
}

impl<S> Default for LineProcessor<S> {
    fn default() -> Self {
        Self {
            state: LineSide::Context,
            context: Vec::new(),
            added: Vec::new(),
            removed: Vec::new(),
            rows: Vec::new(),
            grammar: GrammarSlots::default(),
            old_line_no: 0,
            new_line_no: 0,
        }
    }
}

impl<S: Clone + Send + Sync + 'static> LineProcessor<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all buffered lines and grammar state, keeping allocations.
    pub fn reset(&mut self) {
        self.state = LineSide::Context;
        self.context.clear();
        self.added.clear();
        self.removed.clear();
        self.rows.clear();
        self.grammar = GrammarSlots::default();
        self.old_line_no = 0;
        self.new_line_no = 0;
    }

    fn initialize(&mut self, hunk: &Hunk) {
        self.reset();
        self.old_line_no = hunk.old_start;
        self.new_line_no = hunk.new_start;
    }

    /// Produces the rows of one hunk, starting with its header row.
    ///
    /// Highlighting failures degrade single lines to plain text. A
    /// [`DiffError::HighlightMismatch`] aborts the hunk.
    pub async fn process<H>(
        &mut self,
        hunk: &Hunk,
        ctx: &HunkContext<'_, H>,
    ) -> Result<Vec<PatchLine>, DiffError>
    where
        H: HighlightProvider<State = S>,
    {
        self.initialize(hunk);
        self.rows.push(DraftRow {
            line: PatchLine::header(hunk.header()),
            no_newline: false,
        });

        for raw in &hunk.lines {
            if is_no_newline_sentinel(raw) {
                self.mark_no_newline();
                continue;
            }

            let side = LineSide::classify(raw);
            if side != self.state {
                self.transition(side, ctx).await?;
            }
            self.buffer(side, raw);
        }

        self.flush_context(ctx).await?;
        self.flush_changes(ctx).await?;

        Ok(self.rows.drain(..).map(DraftRow::finish).collect())
    }

    fn buffer(&mut self, side: LineSide, raw: &str) {
        let mut chars = raw.chars();
        chars.next();
        let text = chars.as_str().to_string();

        let (old_line_no, new_line_no) = match side {
            LineSide::Context => {
                let numbers = (Some(self.old_line_no), Some(self.new_line_no));
                self.old_line_no += 1;
                self.new_line_no += 1;
                numbers
            }
            LineSide::Remove => {
                let number = self.old_line_no;
                self.old_line_no += 1;
                (Some(number), None)
            }
            LineSide::Add => {
                let number = self.new_line_no;
                self.new_line_no += 1;
                (None, Some(number))
            }
        };

        let line = BufferedLine {
            text,
            old_line_no,
            new_line_no,
            no_newline: false,
        };
        match side {
            LineSide::Context => self.context.push(line),
            LineSide::Add => self.added.push(line),
            LineSide::Remove => self.removed.push(line),
        }
    }

    fn mark_no_newline(&mut self) {
        let buffer = match self.state {
            LineSide::Context => &mut self.context,
            LineSide::Add => &mut self.added,
            LineSide::Remove => &mut self.removed,
        };
        match buffer.last_mut() {
            Some(line) => line.no_newline = true,
            None => log::debug!("No-newline marker without a preceding line"),
        }
    }

    async fn transition<H>(&mut self, next: LineSide, ctx: &HunkContext<'_, H>) -> Result<(), DiffError>
    where
        H: HighlightProvider<State = S>,
    {
        match (self.state, next) {
            (LineSide::Context, _) => self.flush_context(ctx).await?,
            (_, LineSide::Context) => self.flush_changes(ctx).await?,
            _ => {}
        }
        self.state = next;
        Ok(())
    }

    async fn flush_context<H>(&mut self, ctx: &HunkContext<'_, H>) -> Result<(), DiffError>
    where
        H: HighlightProvider<State = S>,
    {
        let mut lines = std::mem::take(&mut self.context);
        for line in &lines {
            let coloring = self.color(LineSide::Context, &line.text, ctx).await;
            let row = build_row(LineSide::Context, line, &whole_line(&line.text), coloring, ctx)?;
            self.rows.push(row);
        }
        lines.clear();
        self.context = lines;
        Ok(())
    }

    async fn flush_changes<H>(&mut self, ctx: &HunkContext<'_, H>) -> Result<(), DiffError>
    where
        H: HighlightProvider<State = S>,
    {
        let mut removed = std::mem::take(&mut self.removed);
        let mut added = std::mem::take(&mut self.added);

        if ctx.options.word_diff && removed.len() == added.len() {
            self.reconcile(&removed, &added, ctx).await?;
        } else {
            for line in &removed {
                let coloring = self.color(LineSide::Remove, &line.text, ctx).await;
                let row = build_row(LineSide::Remove, line, &whole_line(&line.text), coloring, ctx)?;
                self.rows.push(row);
            }
            for line in &added {
                let coloring = self.color(LineSide::Add, &line.text, ctx).await;
                let row = build_row(LineSide::Add, line, &whole_line(&line.text), coloring, ctx)?;
                self.rows.push(row);
            }
        }

        removed.clear();
        added.clear();
        self.removed = removed;
        self.added = added;
        Ok(())
    }

    /// Word-diffs removed line i against added line i. All removed rows are
    /// emitted before all added rows.
    async fn reconcile<H>(
        &mut self,
        removed: &[BufferedLine],
        added: &[BufferedLine],
        ctx: &HunkContext<'_, H>,
    ) -> Result<(), DiffError>
    where
        H: HighlightProvider<State = S>,
    {
        let mut added_rows = Vec::with_capacity(added.len());
        for (old, new) in removed.iter().zip(added) {
            let (old_spans, new_spans) = word_diff_spans(&old.text, &new.text);

            let old_coloring = self.color(LineSide::Remove, &old.text, ctx).await;
            let new_coloring = self.color(LineSide::Add, &new.text, ctx).await;

            self.rows
                .push(build_row(LineSide::Remove, old, &old_spans, old_coloring, ctx)?);
            added_rows.push(build_row(LineSide::Add, new, &new_spans, new_coloring, ctx)?);
        }
        self.rows.extend(added_rows);
        Ok(())
    }

    async fn color<H>(&mut self, side: LineSide, text: &str, ctx: &HunkContext<'_, H>) -> Coloring
    where
        H: HighlightProvider<State = S>,
    {
        if !ctx.options.syntax_highlighting {
            return Coloring::Disabled;
        }

        let prior = self.grammar.prior(side);
        match ctx
            .highlighter
            .tokenize(text, ctx.language, &ctx.options.theme, prior)
            .await
        {
            Ok(line) => {
                self.grammar.advance(side, line.state);
                Coloring::Tokens(line.tokens)
            }
            Err(err) => {
                log::error!(
                    "Failed to highlight {} line as {}: {err}",
                    side.row_kind().prefix().unwrap_or(' '),
                    ctx.language.name()
                );
                self.grammar.reset();
                Coloring::Failed
            }
        }
    }
}

fn build_row<H>(
    side: LineSide,
    line: &BufferedLine,
    spans: &[Span],
    coloring: Coloring,
    ctx: &HunkContext<'_, H>,
) -> Result<DraftRow, DiffError> {
    let content = match coloring {
        Coloring::Disabled => build_segments(&line.text, spans, None)?,
        Coloring::Tokens(tokens) => build_segments(&line.text, spans, Some(&tokens))?,
        Coloring::Failed => vec![LineSegment::plain(line.text.clone())],
    };

    Ok(DraftRow {
        line: PatchLine {
            kind: side.row_kind(),
            content,
            inner_kind: inner_kind(ctx.nested_patch, &line.text),
            old_line_no: line.old_line_no,
            new_line_no: line.new_line_no,
            line_break: false,
        },
        no_newline: line.no_newline,
    })
}

fn inner_kind(nested_patch: bool, text: &str) -> InnerPatchLineType {
    if !nested_patch {
        return InnerPatchLineType::None;
    }
    match text.as_bytes().first() {
        Some(b'+') => InnerPatchLineType::Add,
        Some(b'-') => InnerPatchLineType::Remove,
        _ => InnerPatchLineType::None,
    }
}

/// Rows of one displayed hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedHunk {
    /// Index of the hunk within its patch, counting hidden hunks.
    pub hunk_index: usize,
    pub lines: Vec<PatchLine>,
}

/// Renders every hunk of a patch with processors taken from `pool`.
///
/// Header-only hunks are skipped when the options ask for it; consecutive
/// displayed hunks are separated by a spacer row.
pub async fn render_patch<H>(
    patch: &ParsedPatch,
    ctx: &HunkContext<'_, H>,
    pool: &LineProcessorPool<H::State>,
) -> Result<Vec<RenderedHunk>, DiffError>
where
    H: HighlightProvider,
{
    let mut rendered: Vec<RenderedHunk> = Vec::with_capacity(patch.hunks.len());

    for (hunk_index, hunk) in patch.hunks.iter().enumerate() {
        if ctx.options.hide_header_only_hunks && is_header_only_hunk(hunk) {
            log::debug!("Skipping header-only hunk {}", hunk.header());
            continue;
        }

        let lines = {
            let mut processor = pool.checkout();
            processor.process(hunk, ctx).await?
        };

        if let Some(previous) = rendered.last_mut() {
            previous.lines.push(PatchLine::spacer());
        }
        rendered.push(RenderedHunk { hunk_index, lines });
    }

    Ok(rendered)
}
