use crate::stats::TodayTotals;

pub fn render_index(date: &str, totals: &TodayTotals) -> String {
    INDEX_HTML
        .replace("{{DATE}}", date)
        .replace("{{INBOUND}}", &totals.inbound.to_string())
        .replace("{{OUTBOUND}}", &totals.outbound.to_string())
        .replace("{{TOTAL}}", &totals.total.to_string())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Call Desk</title>
  <style>
    :root {
      --bg: #eef2f5;
      --ink: #1f2a33;
      --muted: #5d6b77;
      --accent: #2f6fb0;
      --danger: #c0392b;
      --card: #ffffff;
      --shadow: 0 12px 32px rgba(31, 42, 51, 0.12);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Segoe UI", "Trebuchet MS", sans-serif;
      padding: 24px;
    }

    .app {
      display: grid;
      grid-template-columns: minmax(320px, 1fr) minmax(320px, 1fr);
      gap: 20px;
      max-width: 1200px;
      margin: 0 auto;
    }

    .card {
      background: var(--card);
      border-radius: 14px;
      box-shadow: var(--shadow);
      padding: 20px;
      display: grid;
      gap: 12px;
      align-content: start;
    }

    h1 {
      margin: 0;
      font-size: 1.6rem;
    }

    h2 {
      margin: 0;
      font-size: 1.1rem;
    }

    label {
      font-size: 0.85rem;
      color: var(--muted);
    }

    input, select, textarea {
      width: 100%;
      padding: 8px 10px;
      border: 1px solid #c9d3db;
      border-radius: 8px;
      font: inherit;
    }

    textarea {
      min-height: 180px;
    }

    button {
      border: none;
      border-radius: 8px;
      padding: 9px 14px;
      background: var(--accent);
      color: white;
      font: inherit;
      cursor: pointer;
    }

    button.danger {
      background: var(--danger);
    }

    .row {
      display: flex;
      gap: 8px;
      align-items: center;
    }

    .row > * {
      flex: 1;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.9rem;
    }

    td, th {
      padding: 4px 6px;
      text-align: left;
      border-bottom: 1px solid #e3e8ec;
    }

    tr.main-row td {
      font-weight: 600;
      background: #f3f6f9;
    }

    .status {
      min-height: 1.2em;
      font-size: 0.9rem;
    }

    .status.error {
      color: var(--danger);
    }

    #undo {
      display: none;
    }

    @media (max-width: 760px) {
      .app {
        grid-template-columns: 1fr;
      }
    }
  </style>
</head>
<body>
  <div class="app">
    <section class="card">
      <h1>Call Desk</h1>
      <div class="status" id="status"></div>

      <label for="main">Main category</label>
      <select id="main"></select>

      <label for="sub">Subcategory</label>
      <input id="sub" list="sub-options" placeholder="Type or pick a subcategory" autocomplete="off" />
      <datalist id="sub-options"></datalist>

      <div class="row">
        <input id="firstName" placeholder="First name" />
        <input id="lastName" placeholder="Last name" />
      </div>
      <div class="row">
        <input id="phoneNumber" placeholder="Phone" />
        <input id="email" placeholder="Email" />
      </div>
      <input id="bpn" placeholder="BPN" />
      <div id="business" class="card" style="display: none; box-shadow: none; padding: 0;">
        <div class="row">
          <input id="businessId" placeholder="Business ID" />
          <input id="companyName" placeholder="Company" />
        </div>
        <div class="row">
          <input id="contact2Name" placeholder="Second contact" />
          <input id="contact2Phone" placeholder="Phone" />
          <input id="contact2Email" placeholder="Email" />
        </div>
        <div class="row">
          <input id="ticketNumber1" placeholder="Ticket 1" />
          <input id="ticketNumber2" placeholder="Ticket 2" />
          <input id="id1" placeholder="ID 1" />
          <input id="id2" placeholder="ID 2" />
        </div>
      </div>
      <div id="custom-inputs"></div>

      <label>Inbound minutes</label>
      <div class="row" id="inbound-entries"></div>
      <label>Outbound minutes</label>
      <div class="row" id="outbound-entries"></div>
      <div class="row">
        <button type="button" data-add="inbound">+ Inbound</button>
        <button type="button" data-add="outbound">+ Outbound</button>
      </div>
      <div class="row">
        <button type="button" data-quick="inbound" data-minutes="1">In +1</button>
        <button type="button" data-quick="inbound" data-minutes="5">In +5</button>
        <button type="button" data-quick="inbound" data-minutes="10">In +10</button>
        <button type="button" data-quick="outbound" data-minutes="1">Out +1</button>
        <button type="button" data-quick="outbound" data-minutes="5">Out +5</button>
        <button type="button" data-quick="outbound" data-minutes="10">Out +10</button>
      </div>
      <div>Today: <span id="inbound-total">{{INBOUND}}</span> min in,
        <span id="outbound-total">{{OUTBOUND}}</span> min out,
        <strong id="grand-total">{{TOTAL}}</strong> min total ({{DATE}})</div>

      <div class="row">
        <button type="button" id="log">Log call</button>
        <button type="button" id="undo" class="danger"></button>
      </div>

      <h2>Summary</h2>
      <textarea id="summary" placeholder="Your documentation summary will appear here..."></textarea>
      <button type="button" id="copy">Copy summary</button>
    </section>

    <section class="card">
      <h2>Today</h2>
      <table id="stats-today"></table>
      <a href="/api/export/today">Export today (CSV)</a>
      <h2>All time</h2>
      <table id="stats-allTime"></table>
      <a href="/api/export/allTime">Export all time (CSV)</a>

      <h2>Categories</h2>
      <div class="row">
        <input id="new-main" placeholder="New main category" />
        <button type="button" id="add-main">Add</button>
      </div>
      <div class="row">
        <input id="new-sub" placeholder="New subcategory under selected" />
        <button type="button" id="add-sub">Add</button>
      </div>
      <textarea id="new-template" placeholder="Template text (optional)" style="min-height: 60px;"></textarea>
      <div id="category-list"></div>

      <h2>Stopwatch</h2>
      <div class="row">
        <strong id="stopwatch-display">00:00:00</strong>
        <input id="stopwatch-name" placeholder="Task name" />
      </div>
      <div class="row">
        <button type="button" id="stopwatch-start">Start</button>
        <button type="button" id="stopwatch-pause" disabled>Pause</button>
        <button type="button" id="stopwatch-reset" class="danger">Reset</button>
      </div>
      <div id="stopwatch-history"></div>

      <h2>Custom fields</h2>
      <div class="row">
        <input id="new-field" placeholder="Field name" />
        <button type="button" id="add-field">Add</button>
      </div>
      <div id="field-list"></div>
    </section>
  </div>

  <script>
    const $ = (id) => document.getElementById(id);
    const customerIds = ['firstName', 'lastName', 'phoneNumber', 'email', 'bpn'];
    const businessIds = ['businessId', 'companyName', 'contact2Name', 'contact2Phone', 'contact2Email',
      'ticketNumber1', 'ticketNumber2', 'id1', 'id2'];
    const snake = (id) => id.replace(/[A-Z]/g, (m) => '_' + m.toLowerCase());
    let categories = [];
    let customFields = [];
    let undoTimer = null;
    let stopwatchTimer = null;

    const el = (tag, text, className) => {
      const node = document.createElement(tag);
      if (text !== undefined) node.textContent = text;
      if (className) node.className = className;
      return node;
    };

    const setStatus = (message, tone) => {
      const status = $('status');
      status.textContent = message;
      status.className = `status ${tone || ''}`;
      if (message && tone !== 'error') {
        setTimeout(() => { if (status.textContent === message) status.textContent = ''; }, 2000);
      }
    };

    const api = async (method, url, body) => {
      const res = await fetch(url, {
        method,
        headers: body ? { 'content-type': 'application/json' } : {},
        body: body ? JSON.stringify(body) : undefined
      });
      if (!res.ok) {
        throw new Error((await res.text()) || 'Request failed');
      }
      return res.status === 204 ? null : res.json();
    };

    const entries = (type) => [...document.querySelectorAll(`#${type}-entries input`)]
      .map((input) => input.value === '' ? null : Math.max(0, parseInt(input.value, 10) || 0));

    const pending = (type) => entries(type).reduce((sum, v) => sum + (v || 0), 0);

    const addEntry = (type) => {
      const input = document.createElement('input');
      input.type = 'number';
      input.min = '0';
      input.placeholder = 'Minutes';
      input.addEventListener('input', refreshDraft);
      $(`${type}-entries`).appendChild(input);
    };

    const addQuickMinutes = (type, minutes) => {
      let inputs = document.querySelectorAll(`#${type}-entries input`);
      if (inputs.length === 0) {
        addEntry(type);
        inputs = document.querySelectorAll(`#${type}-entries input`);
      }
      const input = inputs[inputs.length - 1];
      input.value = (parseInt(input.value, 10) || 0) + minutes;
      return refreshDraft();
    };

    const clockTime = (seconds) => [Math.floor(seconds / 3600), Math.floor((seconds % 3600) / 60), seconds % 60]
      .map((part) => String(part).padStart(2, '0'))
      .join(':');

    const renderStopwatch = (view) => {
      clearInterval(stopwatchTimer);
      let elapsed = view.elapsed_secs;
      const paint = () => { $('stopwatch-display').textContent = clockTime(elapsed); };
      paint();
      if (view.running) {
        stopwatchTimer = setInterval(() => { elapsed += 1; paint(); }, 1000);
      }
      $('stopwatch-start').disabled = view.running;
      $('stopwatch-pause').disabled = !view.running;

      const list = $('stopwatch-history');
      list.replaceChildren();
      if (view.history.length === 0) {
        list.appendChild(el('div', 'No recorded sessions yet'));
        return;
      }
      view.history.forEach((entry, index) => {
        const row = el('div', undefined, 'row');
        row.append(el('span', entry.name), el('span', new Date(entry.timestamp).toLocaleString()),
          el('strong', clockTime(entry.duration)));
        const remove = el('button', 'Delete', 'danger');
        remove.onclick = () => {
          if (!confirm('Delete this timer entry?')) return;
          report(api('DELETE', `/api/stopwatch/history/${index}?confirm=1`).then(loadStopwatch));
        };
        row.appendChild(remove);
        list.appendChild(row);
      });
    };

    const loadStopwatch = async () => renderStopwatch(await api('GET', '/api/stopwatch'));

    const renderCategories = () => {
      const select = $('main');
      const current = select.value;
      select.innerHTML = '<option value="">-- Select Main Category --</option>';
      categories.forEach((c) => select.add(new Option(c.name, c.key)));
      if (categories.some((c) => c.key === current)) select.value = current;

      const list = $('category-list');
      list.innerHTML = '';
      const selected = categories.find((c) => c.key === select.value);
      if (!selected) return;
      const header = document.createElement('div');
      header.className = 'row';
      header.appendChild(el('strong', selected.name));
      const del = document.createElement('button');
      del.className = 'danger';
      del.textContent = 'Delete category';
      del.onclick = () => deleteMain(selected);
      header.appendChild(del);
      list.appendChild(header);
      selected.subcategories.forEach((sub) => {
        const item = document.createElement('div');
        item.className = 'card';
        item.style.boxShadow = 'none';
        const template = el('textarea');
        template.style.minHeight = '60px';
        template.value = sub.template;
        item.append(el('span', sub.name), template);
        const save = document.createElement('button');
        save.textContent = 'Save';
        save.onclick = () => api('PUT', `/api/categories/${selected.key}/subcategories/${sub.key}`,
          { template: template.value })
          .then(() => { setStatus('Subcategory updated!', 'ok'); return loadCategories(); })
          .catch((err) => setStatus(err.message, 'error'));
        const remove = document.createElement('button');
        remove.className = 'danger';
        remove.textContent = 'Delete';
        remove.onclick = () => {
          if (!confirm(`Are you sure you want to delete "${sub.name}"?`)) return;
          api('DELETE', `/api/categories/${selected.key}/subcategories/${sub.key}?confirm=1`)
            .then(() => { setStatus('Subcategory deleted!', 'ok'); return loadCategories(); })
            .catch((err) => setStatus(err.message, 'error'));
        };
        item.append(save, remove);
        list.appendChild(item);
      });
    };

    const deleteMain = (category) => {
      const count = category.subcategories.length;
      const first = count > 0
        ? `You are about to delete "${category.name}" and its ${count} subcategory(ies). Continue?`
        : `Are you sure you want to delete the main category "${category.name}"?`;
      if (!confirm(first)) return;
      if (!confirm(`FINAL CONFIRMATION: deleting "${category.name}" is PERMANENT. Delete it?`)) return;
      api('DELETE', `/api/categories/${category.key}?confirm=2`)
        .then(() => { setStatus('Main category deleted!', 'ok'); return loadCategories(); })
        .catch((err) => setStatus(err.message, 'error'));
    };

    const renderFields = () => {
      const inputs = $('custom-inputs');
      const values = [...inputs.querySelectorAll('input')].map((i) => i.value);
      inputs.innerHTML = '';
      const list = $('field-list');
      list.innerHTML = '';
      customFields.forEach((field, index) => {
        const input = document.createElement('input');
        input.placeholder = field.name;
        input.value = values[index] || '';
        input.addEventListener('input', refreshDraft);
        inputs.appendChild(input);

        const row = document.createElement('div');
        row.className = 'row';
        row.appendChild(el('span', field.name));
        const remove = document.createElement('button');
        remove.className = 'danger';
        remove.textContent = 'Delete';
        remove.onclick = () => {
          if (!confirm(`Are you sure you want to delete the field "${field.name}"?`)) return;
          api('DELETE', `/api/custom-fields/${field.index}?confirm=1`)
            .then(loadFields)
            .catch((err) => setStatus(err.message, 'error'));
        };
        row.appendChild(remove);
        list.appendChild(row);
      });
    };

    const renderStats = (window, data) => {
      const table = $(`stats-${window}`);
      table.replaceChildren();
      const addRow = (cells, className, cellTag) => {
        const row = el('tr', undefined, className);
        cells.forEach((cell) => row.appendChild(el(cellTag || 'td', String(cell))));
        table.appendChild(row);
        return row;
      };
      addRow(['Category', 'Calls', 'In', 'Out', 'Avg', '%'], undefined, 'th');
      data.categories.filter((c) => c.totals.calls > 0).forEach((c) => {
        addRow([c.name, c.totals.calls, c.totals.inbound, c.totals.outbound, c.average_minutes,
          `${c.percentage.toFixed(1)}%`], 'main-row');
        c.subcategories.filter((s) => s.stats.calls > 0).forEach((s) => {
          const row = addRow([s.name, s.stats.calls, s.stats.inbound, s.stats.outbound, s.average_minutes, '']);
          row.firstChild.style.paddingLeft = '20px';
        });
      });
      if (data.total_calls > 0) {
        addRow(['Total', data.totals.calls, data.totals.inbound, data.totals.outbound, data.average_minutes,
          '100.0%'], 'main-row');
      } else {
        const cell = addRow(['No calls logged yet.']).firstChild;
        cell.colSpan = 6;
      }
    };

    const loadCategories = async () => {
      categories = await api('GET', '/api/categories');
      renderCategories();
      await Promise.all([loadStats(), refreshDraft()]);
    };

    const loadFields = async () => {
      customFields = await api('GET', '/api/custom-fields');
      renderFields();
      await refreshDraft();
    };

    const loadStats = async () => {
      for (const window of ['today', 'allTime']) {
        renderStats(window, await api('GET', `/api/stats/${window}`));
      }
    };

    const loadNotices = async () => {
      const notices = await api('GET', '/api/notices');
      if (notices.length) setStatus(notices.join(' '), 'warn');
    };

    const loadSuggestions = async () => {
      const main = $('main').value;
      const list = $('sub-options');
      list.innerHTML = '';
      if (!main) return;
      const q = encodeURIComponent($('sub').value);
      (await api('GET', `/api/categories/${encodeURIComponent(main)}/suggestions?q=${q}`))
        .forEach((s) => list.appendChild(new Option(s.name)));
    };

    const refreshDraft = async () => {
      $('business').style.display = $('main').value === 'kayttotuki' ? 'grid' : 'none';
      const inbound = pending('inbound');
      const outbound = pending('outbound');
      const totals = await api('GET', `/api/totals?inbound=${inbound}&outbound=${outbound}`);
      $('inbound-total').textContent = totals.inbound;
      $('outbound-total').textContent = totals.outbound;
      $('grand-total').textContent = totals.total;

      const customer = {};
      customerIds.forEach((id) => customer[snake(id)] = $(id).value);
      const business = {};
      businessIds.forEach((id) => business[snake(id)] = $(id).value);
      const body = {
        main_key: $('main').value,
        subcategory: $('sub').value,
        customer,
        business,
        custom_values: [...$('custom-inputs').querySelectorAll('input')].map((i) => i.value),
        inbound_minutes: inbound,
        outbound_minutes: outbound
      };
      const { summary } = await api('POST', '/api/summary', body);
      $('summary').value = summary || '';
    };

    const showUndo = (seconds) => {
      const button = $('undo');
      clearInterval(undoTimer);
      let left = seconds;
      const paint = () => {
        button.textContent = `Undo Last Call (${left}s)`;
        button.style.display = left > 0 ? 'block' : 'none';
      };
      paint();
      undoTimer = setInterval(() => {
        left -= 1;
        paint();
        if (left <= 0) clearInterval(undoTimer);
      }, 1000);
    };

    const hideUndo = () => {
      clearInterval(undoTimer);
      $('undo').style.display = 'none';
    };

    const logCall = async () => {
      const result = await api('POST', '/api/calls', {
        main_key: $('main').value,
        subcategory: $('sub').value,
        inbound: entries('inbound'),
        outbound: entries('outbound')
      });
      setStatus('Call logged successfully!', 'ok');
      showUndo(result.undo_seconds);
      [...customerIds, ...businessIds].forEach((id) => $(id).value = '');
      document.querySelectorAll('#custom-inputs input, #inbound-entries input, #outbound-entries input')
        .forEach((input) => input.value = '');
      categories = await api('GET', '/api/categories');
      renderCategories();
      await Promise.all([loadStats(), refreshDraft(), loadNotices(), loadStopwatch()]);
    };

    const undoCall = async () => {
      await api('POST', '/api/undo');
      hideUndo();
      setStatus('Last call undone successfully!', 'ok');
      await Promise.all([loadStats(), refreshDraft()]);
    };

    const report = (promise) => promise.catch((err) => setStatus(err.message, 'error'));

    $('main').addEventListener('change', () => {
      $('sub').value = '';
      renderCategories();
      report(Promise.all([loadSuggestions(), refreshDraft()]));
    });
    $('sub').addEventListener('input', () => report(Promise.all([loadSuggestions(), refreshDraft()])));
    [...customerIds, ...businessIds].forEach((id) => $(id).addEventListener('input', () => report(refreshDraft())));
    document.querySelectorAll('[data-quick]').forEach((b) => b.addEventListener('click',
      () => report(addQuickMinutes(b.dataset.quick, parseInt(b.dataset.minutes, 10)))));
    $('stopwatch-start').addEventListener('click', () => report(api('POST', '/api/stopwatch/start').then(renderStopwatch)));
    $('stopwatch-pause').addEventListener('click', () => report(api('POST', '/api/stopwatch/pause').then(renderStopwatch)));
    $('stopwatch-reset').addEventListener('click', () => report(api('POST', '/api/stopwatch/reset',
      { name: $('stopwatch-name').value }).then((view) => { $('stopwatch-name').value = ''; renderStopwatch(view); })));
    document.querySelectorAll('[data-add]').forEach((b) => b.addEventListener('click', () => addEntry(b.dataset.add)));
    $('log').addEventListener('click', () => report(logCall()));
    $('undo').addEventListener('click', () => report(undoCall()));
    $('copy').addEventListener('click', () => report(navigator.clipboard.writeText($('summary').value)
      .then(() => setStatus('Summary copied to clipboard!', 'ok'))));
    $('add-main').addEventListener('click', () => report(api('POST', '/api/categories', { name: $('new-main').value })
      .then(() => { $('new-main').value = ''; setStatus('Main category added!', 'ok'); return loadCategories(); })));
    $('add-sub').addEventListener('click', () => {
      const main = $('main').value;
      if (!main) return setStatus('Please select a main category first!', 'error');
      report(api('POST', `/api/categories/${main}/subcategories`,
        { name: $('new-sub').value, template: $('new-template').value })
        .then(() => { $('new-sub').value = ''; $('new-template').value = ''; setStatus('Subcategory added!', 'ok'); return loadCategories(); }));
    });
    $('add-field').addEventListener('click', () => report(api('POST', '/api/custom-fields', { name: $('new-field').value })
      .then(() => { $('new-field').value = ''; setStatus('Custom field added!', 'ok'); return loadFields(); })));

    addEntry('inbound');
    addEntry('outbound');
    report((async () => {
      await Promise.all([loadCategories(), loadFields(), loadStopwatch()]);
      const undo = await api('GET', '/api/undo');
      if (undo.seconds_left) showUndo(undo.seconds_left);
      await loadNotices();
    })());
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_fills_in_todays_totals() {
        let html = render_index(
            "2026-10-19",
            &TodayTotals {
                inbound: 12,
                outbound: 3,
                total: 15,
            },
        );
        assert!(html.contains("<span id=\"inbound-total\">12</span>"));
        assert!(html.contains("<strong id=\"grand-total\">15</strong> min total (2026-10-19)"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn page_builds_user_text_without_markup_interpolation() {
        assert!(!INDEX_HTML.contains("innerHTML = `"));
        assert!(!INDEX_HTML.contains("innerHTML +="));
        assert!(INDEX_HTML.contains("encodeURIComponent(main)"));
    }

    #[test]
    fn page_has_quick_minutes_and_stopwatch_controls() {
        for minutes in ["1", "5", "10"] {
            assert!(INDEX_HTML.contains(&format!("data-quick=\"inbound\" data-minutes=\"{minutes}\"")));
            assert!(INDEX_HTML.contains(&format!("data-quick=\"outbound\" data-minutes=\"{minutes}\"")));
        }
        for id in ["stopwatch-start", "stopwatch-pause", "stopwatch-reset", "stopwatch-history"] {
            assert!(INDEX_HTML.contains(&format!("id=\"{id}\"")));
        }
        assert!(INDEX_HTML.contains("confirm('Delete this timer entry?')"));
    }
}
