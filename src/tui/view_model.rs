use super::state::ViewerState;

pub(super) struct LogViewModel {
    pub(super) scroll_offset: usize,
    pub(super) max_offset: usize,
    pub(super) scrollbar_total: usize,
}

/// Clamps the stored offset against what `total` visible lines need.
/// `rows_at(position)` is how many terminal rows that line occupies, so
/// wrapped lines shift the bottom-most offset.
pub(super) fn build_log_view_model<F>(
    state: &mut ViewerState,
    total: usize,
    output_height: usize,
    rows_at: F,
) -> LogViewModel
where
    F: Fn(usize) -> usize,
{
    let max = max_offset(total, output_height, rows_at);
    state.scroll_offset = if state.follow {
        max
    } else {
        state.scroll_offset.min(max)
    };
    LogViewModel {
        scroll_offset: state.scroll_offset,
        max_offset: max,
        scrollbar_total: output_height.max(1).saturating_add(max),
    }
}

fn max_offset<F>(total: usize, output_height: usize, rows_at: F) -> usize
where
    F: Fn(usize) -> usize,
{
    let height = output_height.max(1);
    let mut used = 0usize;
    let mut start = total;
    while start > 0 {
        let rows = rows_at(start - 1).max(1);
        if used + rows > height {
            break;
        }
        used += rows;
        start -= 1;
    }
    start
}

/// Scrolls so `position` lands mid-screen unless it is already on screen.
/// Leaves follow mode, since the view is now pinned to a match.
pub(super) fn reveal_position(state: &mut ViewerState, position: usize, output_height: usize) {
    let height = output_height.max(1);
    let on_screen = position >= state.scroll_offset && position < state.scroll_offset + height;
    if !on_screen || state.follow {
        state.scroll_offset = position.saturating_sub(height / 2);
    }
    state.follow = false;
}

pub(super) fn wrapped_rows(text: &str, width: usize) -> usize {
    if width == 0 {
        return 1;
    }
    text.chars().count().div_ceil(width).max(1)
}
