//! Cursor and viewport movement shared by every table pane.
//!
//! The transitions only talk to a pane through [`View`], so they don't depend
//! on how the pane is drawn.  A pane rejects a cursor it can't show, and the
//! transitions react to that by scrolling the origin instead.

use thiserror::Error;

mod pane;

pub use pane::{Columns, Pane};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The point lies outside the visible area
    #[error("invalid point ({0}, {1})")]
    InvalidPoint(usize, usize),
}

pub type Result<T> = core::result::Result<T, Error>;

/// How far one navigation step moves in each direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Speed {
    pub right: usize,
    pub left: usize,
    pub down: usize,
    pub up: usize,
}

/// The navigation contract of a pane
pub trait View {
    fn cursor(&self) -> (usize, usize);
    fn origin(&self) -> (usize, usize);
    fn set_cursor(&mut self, x: usize, y: usize) -> Result<()>;
    fn set_origin(&mut self, x: usize, y: usize) -> Result<()>;
    fn speed(&self) -> Speed;
    /// Visible rows and total rows
    fn limits(&self) -> (usize, usize);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Down,
    Up,
    Right,
    Left,
    Home,
    End,
    PageDown,
    PageUp,
}

pub fn apply<V: View + ?Sized>(view: &mut V, action: Action) -> Result<()> {
    match action {
        Action::Down => down(view),
        Action::Up => up(view),
        Action::Right => right(view),
        Action::Left => left(view),
        Action::Home => home(view),
        Action::End => end(view),
        Action::PageDown => page_down(view),
        Action::PageUp => page_up(view),
    }
}

pub fn down<V: View + ?Sized>(view: &mut V) -> Result<()> {
    let (cx, cy) = view.cursor();
    let speed = view.speed().down;
    if view.set_cursor(cx, cy + speed).is_err() {
        let (ox, oy) = view.origin();
        view.set_origin(ox, oy + speed)?;
    }
    Ok(())
}

pub fn up<V: View + ?Sized>(view: &mut V) -> Result<()> {
    let (cx, cy) = view.cursor();
    let speed = view.speed().up;
    let moved = cy.checked_sub(speed).map_or(false, |y| view.set_cursor(cx, y).is_ok());
    if !moved {
        let (ox, oy) = view.origin();
        if oy >= speed {
            view.set_origin(ox, oy - speed)?;
        }
    }
    Ok(())
}

pub fn right<V: View + ?Sized>(view: &mut V) -> Result<()> {
    let (cx, cy) = view.cursor();
    let speed = view.speed().right;
    if view.set_cursor(cx + speed, cy).is_err() {
        let (ox, oy) = view.origin();
        view.set_origin(ox + speed, oy)?;
    }
    Ok(())
}

pub fn left<V: View + ?Sized>(view: &mut V) -> Result<()> {
    let (cx, cy) = view.cursor();
    let speed = view.speed().left;
    let moved = cx.checked_sub(speed).map_or(false, |x| view.set_cursor(x, cy).is_ok());
    if !moved {
        let (ox, oy) = view.origin();
        // the origin absorbs what the cursor can't
        if ox + cx >= speed {
            view.set_cursor(0, cy)?;
            view.set_origin(ox + cx - speed, oy)?;
        }
    }
    Ok(())
}

pub fn home<V: View + ?Sized>(view: &mut V) -> Result<()> {
    let (_, oy) = view.origin();
    view.set_origin(0, oy)?;
    let (_, cy) = view.cursor();
    view.set_cursor(0, cy)
}

pub fn end<V: View + ?Sized>(view: &mut V) -> Result<()> {
    let (page_size, full_size) = view.limits();
    let page_size = page_size.min(full_size);
    if page_size == 0 {
        return Ok(());
    }
    let (cx, _) = view.cursor();
    view.set_cursor(cx, page_size - 1)?;
    let (ox, _) = view.origin();
    view.set_origin(ox, full_size - page_size)
}

pub fn page_down<V: View + ?Sized>(view: &mut V) -> Result<()> {
    let (page_size, full_size) = view.limits();
    if page_size == 0 || full_size == 0 {
        return Ok(());
    }
    let (ox, oy) = view.origin();
    let (cx, cy) = view.cursor();
    let target = (oy + cy + page_size).min(full_size - 1);
    let origin = (oy + page_size).min(full_size.saturating_sub(page_size));
    view.set_origin(ox, origin)?;
    view.set_cursor(cx, target - origin)
}

pub fn page_up<V: View + ?Sized>(view: &mut V) -> Result<()> {
    let (page_size, full_size) = view.limits();
    if page_size == 0 || full_size == 0 {
        return Ok(());
    }
    let (ox, oy) = view.origin();
    let (cx, cy) = view.cursor();
    let target = (oy + cy).saturating_sub(page_size);
    let origin = oy.saturating_sub(page_size);
    view.set_origin(ox, origin)?;
    view.set_cursor(cx, target - origin)
}
