//! JavaScript expression builders
//!
//! Each driver operation evaluates one self-contained IIFE inside the target
//! frame and reads the JSON value back via `returnByValue`. Selectors are
//! compiled to a `collect` function returning the current matches; string
//! parameters are embedded as JSON literals so no escaping can leak into the
//! expression.

use crate::locator::{Role, Selector};

/// Embed a Rust string as a JSON string literal inside a JS expression.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// JS function expression evaluating to the ordered array of current matches.
fn collect_fn(selector: &Selector) -> String {
    match selector {
        Selector::ByCss(css) => format!(
            "() => {{ try {{ return Array.from(document.querySelectorAll({css})); }} catch (err) {{ return []; }} }}",
            css = js_string(css)
        ),
        Selector::ByRole { role, name } => role_collect_fn(*role, name),
    }
}

/// Role matching covers the explicit `role` attribute plus the implicit
/// roles of the handful of tags this suite interacts with. The accessible
/// name is approximated from aria-label, aria-labelledby, associated labels,
/// rendered text, value, placeholder and title, compared case-insensitively
/// after trimming (the way the remote grid exposes its controls).
fn role_collect_fn(role: Role, name: &str) -> String {
    format!(
        "() => {{\n\
             const role = {role};\n\
             const wanted = {name}.trim().toLowerCase();\n\
             const implicitRole = (el) => {{\n\
                 const tag = el.tagName.toLowerCase();\n\
                 const type = (el.getAttribute('type') || '').toLowerCase();\n\
                 switch (tag) {{\n\
                     case 'a': return el.hasAttribute('href') ? 'link' : null;\n\
                     case 'button': return 'button';\n\
                     case 'textarea': return 'textbox';\n\
                     case 'input':\n\
                         if (['button', 'submit', 'reset', 'image'].includes(type)) return 'button';\n\
                         if (type === 'number') return 'spinbutton';\n\
                         if (['', 'text', 'search', 'email', 'tel', 'url', 'password'].includes(type)) return 'textbox';\n\
                         return null;\n\
                     default: return null;\n\
                 }}\n\
             }};\n\
             const accessibleName = (el) => {{\n\
                 const aria = el.getAttribute('aria-label');\n\
                 if (aria) return aria;\n\
                 const labelledBy = el.getAttribute('aria-labelledby');\n\
                 if (labelledBy) {{\n\
                     const joined = labelledBy.split(/\\s+/)\n\
                         .map((id) => {{ const ref = document.getElementById(id); return ref ? ref.textContent : ''; }})\n\
                         .join(' ').trim();\n\
                     if (joined) return joined;\n\
                 }}\n\
                 if (el.labels && el.labels.length) {{\n\
                     const fromLabels = Array.from(el.labels, (l) => l.textContent).join(' ').trim();\n\
                     if (fromLabels) return fromLabels;\n\
                 }}\n\
                 const text = (el.textContent || '').trim();\n\
                 if (text) return text;\n\
                 if (el.value) return String(el.value);\n\
                 return el.getAttribute('placeholder') || el.getAttribute('title') || '';\n\
             }};\n\
             const out = [];\n\
             for (const el of document.querySelectorAll('*')) {{\n\
                 const actual = el.getAttribute('role') || implicitRole(el);\n\
                 if (actual !== role) continue;\n\
                 if (accessibleName(el).trim().toLowerCase() !== wanted) continue;\n\
                 out.push(el);\n\
             }}\n\
             return out;\n\
         }}",
        role = js_string(role.as_str()),
        name = js_string(name),
    )
}

pub fn count_expression(selector: &Selector) -> String {
    format!(
        "(() => {{ const collect = {collect}; return collect().length; }})()",
        collect = collect_fn(selector)
    )
}

pub fn visibility_expression(selector: &Selector) -> String {
    format!(
        "(() => {{\n\
             const collect = {collect};\n\
             const el = collect()[0];\n\
             if (!el) return false;\n\
             const rect = el.getBoundingClientRect();\n\
             const style = window.getComputedStyle(el);\n\
             return rect.width > 0 && rect.height > 0\n\
                 && style.visibility !== 'hidden' && style.display !== 'none';\n\
         }})()",
        collect = collect_fn(selector)
    )
}

pub fn click_expression(selector: &Selector) -> String {
    format!(
        "(() => {{\n\
             const collect = {collect};\n\
             const el = collect()[0];\n\
             if (!el) return {{ status: 'not-found' }};\n\
             el.click();\n\
             return {{ status: 'clicked' }};\n\
         }})()",
        collect = collect_fn(selector)
    )
}

/// Writes through the native value setter and fires input/change so
/// framework-managed inputs (the grid is React) observe the edit.
pub fn fill_expression(selector: &Selector, text: &str) -> String {
    format!(
        "(() => {{\n\
             const collect = {collect};\n\
             const el = collect()[0];\n\
             if (!el) return {{ status: 'not-found' }};\n\
             if (typeof el.focus === 'function') el.focus();\n\
             const proto = el instanceof HTMLTextAreaElement\n\
                 ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;\n\
             const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;\n\
             setter.call(el, {text});\n\
             el.dispatchEvent(new Event('input', {{ bubbles: true }}));\n\
             el.dispatchEvent(new Event('change', {{ bubbles: true }}));\n\
             return {{ status: 'filled' }};\n\
         }})()",
        collect = collect_fn(selector),
        text = js_string(text),
    )
}

pub fn select_expression(selector: &Selector, value: &str) -> String {
    format!(
        "(() => {{\n\
             const collect = {collect};\n\
             const el = collect()[0];\n\
             if (!el) return {{ status: 'not-found' }};\n\
             const wanted = {value};\n\
             const option = Array.from(el.options || [])\n\
                 .find((o) => o.value === wanted || o.label === wanted || o.text.trim() === wanted);\n\
             if (!option) return {{ status: 'option-not-found' }};\n\
             const setter = Object.getOwnPropertyDescriptor(HTMLSelectElement.prototype, 'value').set;\n\
             setter.call(el, option.value);\n\
             el.dispatchEvent(new Event('change', {{ bubbles: true }}));\n\
             return {{ status: 'selected' }};\n\
         }})()",
        collect = collect_fn(selector),
        value = js_string(value),
    )
}

pub fn texts_expression(selector: &Selector) -> String {
    format!(
        "(() => {{ const collect = {collect}; return collect().map((el) => (el.textContent || '').trim()); }})()",
        collect = collect_fn(selector)
    )
}

pub fn value_expression(selector: &Selector) -> String {
    format!(
        "(() => {{\n\
             const collect = {collect};\n\
             const el = collect()[0];\n\
             if (!el) return null;\n\
             return el.value === undefined ? '' : String(el.value);\n\
         }})()",
        collect = collect_fn(selector)
    )
}
