use crate::render::{Grid, MonthRow};
use std::fmt::Write;

pub fn render_index(title: &str, grid: &Grid, show_week_separators: bool, has_calendar: bool) -> String {
    INDEX_HTML
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{ROOT_CLASS}}", if show_week_separators { "show-week-separators" } else { "" })
        .replace("{{WEEK_CHECKED}}", if show_week_separators { "checked" } else { "" })
        .replace("{{REFRESH_HIDDEN}}", if has_calendar { "" } else { "hidden" })
        .replace("{{SUMMARY}}", &escape_html(&grid.summary.label()))
        .replace("{{ROWS}}", &render_rows(&grid.rows))
}

fn render_rows(rows: &[MonthRow]) -> String {
    let mut html = String::new();
    for row in rows {
        let _ = write!(
            html,
            r#"<div class="month-row"><div class="month-label">{}</div><div class="days-wrap">"#,
            escape_html(&row.label)
        );
        for cell in &row.cells {
            let _ = write!(
                html,
                r#"<div class="{}" data-date="{date}" title="{date}"></div>"#,
                cell.classes(),
                date = cell.date
            );
        }
        html.push_str("</div></div>\n");
    }
    html
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en" class="{{ROOT_CLASS}}" data-theme="light">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --bg: #f8f3e6;
      --ink: #2b2a28;
      --muted: #6b645d;
      --card: rgba(255, 255, 255, 0.9);
      --cell: #e7e2d8;
      --done: #4caf50;
      --not-done: #f87171;
      --separator: rgba(47, 72, 88, 0.45);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    [data-theme="dark"] {
      --bg: #1d1f24;
      --ink: #ece8e1;
      --muted: #a39d94;
      --card: rgba(40, 43, 50, 0.92);
      --cell: #3a3e47;
      --separator: rgba(236, 232, 225, 0.45);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(1100px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 20px;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.6rem, 3vw, 2.2rem);
    }

    .toolbar {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      gap: 12px;
    }

    .toolbar button,
    .toolbar a {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 10px 16px;
      font: inherit;
      font-weight: 600;
      background: #2f4858;
      color: white;
      cursor: pointer;
      text-decoration: none;
    }

    .summary {
      font-weight: 600;
    }

    .tracker {
      display: flex;
      flex-direction: column;
      gap: 8px;
    }

    .month-row {
      display: flex;
      align-items: center;
    }

    .month-label {
      width: 96px;
      flex: 0 0 96px;
      color: var(--muted);
    }

    .days-wrap {
      display: flex;
      gap: 6px;
      overflow: auto;
      padding-bottom: 4px;
    }

    .day-square {
      position: relative;
      width: 14px;
      height: 14px;
      flex: 0 0 14px;
      background: var(--cell);
      border-radius: 3px;
      cursor: pointer;
    }

    .day-square.done {
      background: var(--done);
    }

    .day-square.not-done {
      background: var(--not-done);
    }

    .show-week-separators .day-square.week-start::before {
      content: '';
      position: absolute;
      left: -4px;
      top: -2px;
      bottom: -2px;
      width: 2px;
      background: var(--separator);
    }

    .status {
      min-height: 1.2em;
      color: #c63b2b;
    }

    .hint {
      margin: 0;
      color: var(--muted);
      font-size: 0.9rem;
    }
  </style>
</head>
<body>
  <main class="app">
    <h1>{{TITLE}}</h1>

    <section class="toolbar">
      <a id="exportBtn" href="/api/export" download="day-tracker.json">Export</a>
      <button id="importBtn" type="button">Import</button>
      <input id="importFile" type="file" accept="application/json,.json" hidden />
      <button id="refreshBtn" type="button" {{REFRESH_HIDDEN}}>Refresh calendar</button>
      <label>
        Theme
        <select id="themeSelect">
          <option value="light">Light</option>
          <option value="dark">Dark</option>
        </select>
      </label>
      <label><input id="showWeekSep" type="checkbox" {{WEEK_CHECKED}} /> Week separators</label>
    </section>

    <div class="summary" id="summary">{{SUMMARY}}</div>
    <div class="tracker" id="tracker">
{{ROWS}}    </div>

    <div class="status" id="status"></div>
    <p class="hint">Click a day to mark it done. Past days without a mark show red.</p>
  </main>

  <script>
    const tracker = document.getElementById('tracker');
    const summaryEl = document.getElementById('summary');
    const statusEl = document.getElementById('status');
    const importBtn = document.getElementById('importBtn');
    const importFile = document.getElementById('importFile');
    const refreshBtn = document.getElementById('refreshBtn');
    const themeSelect = document.getElementById('themeSelect');
    const showWeekSep = document.getElementById('showWeekSep');

    const setStatus = (message) => {
      statusEl.textContent = message || '';
    };

    const classesFor = (cell) => {
      let classes = 'day-square';
      if (cell.week_start) classes += ' week-start';
      if (cell.state !== 'neutral') classes += ' ' + cell.state;
      return classes;
    };

    const applyCell = (cell) => {
      const el = tracker.querySelector(`[data-date="${cell.date}"]`);
      if (el) el.className = classesFor(cell);
    };

    const applySummary = (summary) => {
      summaryEl.textContent = `${summary.done_count}/${summary.total_count} days — ${summary.percent}% complete`;
    };

    const applyGrid = (grid) => {
      grid.rows.forEach((row) => row.cells.forEach(applyCell));
      applySummary(grid.summary);
    };

    const send = async (url, options) => {
      const res = await fetch(url, options);
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      return res.json();
    };

    tracker.addEventListener('click', (event) => {
      const square = event.target.closest('.day-square');
      if (!square) return;
      send('/api/toggle', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ date: square.dataset.date })
      })
        .then((data) => {
          if (data.cell) applyCell(data.cell);
          applySummary(data.summary);
          setStatus('');
        })
        .catch((err) => setStatus(err.message));
    });

    importBtn.addEventListener('click', () => importFile.click());
    importFile.addEventListener('change', () => {
      const file = importFile.files && importFile.files[0];
      if (!file) return;
      file.text()
        .then((text) => send('/api/import', {
          method: 'POST',
          headers: { 'content-type': 'application/json' },
          body: text
        }))
        .then((grid) => {
          applyGrid(grid);
          setStatus('');
        })
        .catch((err) => alert(err.message))
        .finally(() => {
          importFile.value = '';
        });
    });

    refreshBtn.addEventListener('click', () => {
      send('/api/refresh', { method: 'POST' })
        .then((data) => applyGrid(data.grid))
        .catch((err) => setStatus(err.message));
    });

    themeSelect.addEventListener('change', () => {
      document.documentElement.setAttribute('data-theme', themeSelect.value);
    });

    showWeekSep.addEventListener('change', () => {
      const show = showWeekSep.checked;
      document.documentElement.classList.toggle('show-week-separators', show);
      send('/api/preferences', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ show_week_separators: show })
      }).catch((err) => setStatus(err.message));
    });
  </script>
</body>
</html>
"#;
