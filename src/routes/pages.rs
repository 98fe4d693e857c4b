use axum::response::Html;

const STYLE: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; color: #222; }
.layout { display: flex; min-height: 100vh; }
.sidebar { width: 200px; background: #f0f2f6; padding: 1.5rem 1rem; }
.sidebar h2 { font-size: 0.8rem; letter-spacing: 0.1em; color: #555; }
.sidebar a { display: block; padding: 0.4rem 0.6rem; margin: 0.2rem 0;
             border-radius: 6px; color: #222; text-decoration: none; }
.sidebar a.active { background: #e03131; color: #fff; }
.content { flex: 1; padding: 2rem; max-width: 900px; }
.content img { max-width: 100%; border-radius: 6px; margin: 0.5rem 0; }
.content pre { background: #f6f6f6; padding: 0.8rem; border-radius: 6px;
               overflow-x: auto; }
.content input[type=text] { width: 60%; padding: 0.4rem; }
.content button { padding: 0.4rem 1rem; margin-left: 0.5rem; }
.record { border: 1px solid #ddd; border-radius: 8px; padding: 1rem;
          margin: 1rem 0; }
.message { color: #a61e1e; }
"#;

fn page(title: &str, active: &str, body: &str) -> Html<String> {
    let nav = ["/", "/upload", "/search"]
        .iter()
        .zip(["Home", "Upload", "Search"])
        .map(|(href, label)| {
            let class = if *href == active { " class=\"active\"" } else { "" };
            format!("<a href=\"{href}\"{class}>{label}</a>")
        })
        .collect::<String>();

    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <div class=\"layout\">\n<nav class=\"sidebar\">\n<h2>WELCOME</h2>\n{nav}\n</nav>\n\
         <main class=\"content\">\n{body}\n</main>\n</div>\n</body>\n</html>\n"
    ))
}

const HOME_BODY: &str = r#"
<h1>Fashion Detection with Bounding Boxes</h1>
<p>Use the sidebar to navigate to the Upload or Search pages.</p>
"#;

const UPLOAD_BODY: &str = r#"
<h1>Upload an Image</h1>
<p><input type="file" id="file-input" accept=".jpg,.jpeg,.png"></p>
<div id="preview"></div>
<p class="message" id="detect-message"></p>
<div id="result" hidden>
  <h2>Image with Bounding Boxes</h2>
  <img id="annotated" alt="Annotated image">
  <h2>Inference Results</h2>
  <pre id="predictions"></pre>
  <p>
    <label>Enter a description for the image:
      <input type="text" id="description">
    </label>
    <button id="save">Save Results to Database</button>
  </p>
  <p class="message" id="save-message"></p>
</div>
<script>
let lastResult = null;
const fileInput = document.getElementById('file-input');

fileInput.addEventListener('change', async () => {
  const file = fileInput.files[0];
  if (!file) return;

  const preview = document.getElementById('preview');
  preview.innerHTML = '';
  const original = document.createElement('img');
  original.src = URL.createObjectURL(file);
  original.alt = 'Uploaded image';
  preview.appendChild(original);

  document.getElementById('detect-message').textContent = '';
  document.getElementById('result').hidden = true;

  const form = new FormData();
  form.append('image', file);
  const response = await fetch('/api/detect', { method: 'POST', body: form });
  if (!response.ok) {
    document.getElementById('detect-message').textContent =
      'Detection failed: ' + await response.text();
    return;
  }

  lastResult = await response.json();
  document.getElementById('annotated').src =
    'data:image/jpeg;base64,' + lastResult.annotated_image;
  document.getElementById('predictions').textContent =
    JSON.stringify(lastResult.predictions, null, 2);
  document.getElementById('result').hidden = false;
});

document.getElementById('save').addEventListener('click', async () => {
  if (!lastResult) return;
  const body = {
    image: lastResult.annotated_image,
    predictions: lastResult.predictions,
    description: document.getElementById('description').value,
  };
  const response = await fetch('/api/records', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify(body),
  });
  const saved = await response.json();
  document.getElementById('save-message').textContent = saved.message;
});
</script>
"#;

const SEARCH_BODY: &str = r#"
<h1>Search Stored Data</h1>
<p>
  <input type="text" id="query" placeholder="e.g. description=eq.red sleeve">
  <button id="search">Search</button>
</p>
<p class="message" id="search-message"></p>
<div id="records"></div>
<script>
document.getElementById('search').addEventListener('click', async () => {
  const q = document.getElementById('query').value.trim();
  const url = q ? '/api/records?q=' + encodeURIComponent(q) : '/api/records';
  const response = await fetch(url);
  const result = await response.json();

  const container = document.getElementById('records');
  container.innerHTML = '';
  const message = document.getElementById('search-message');
  if (result.error) {
    message.textContent = result.error;
  } else if (result.records.length === 0) {
    message.textContent = 'No data found for the given query.';
  } else {
    message.textContent = '';
  }

  for (const record of result.records) {
    const item = document.createElement('div');
    item.className = 'record';

    const img = document.createElement('img');
    img.src = 'data:image/jpeg;base64,' + record.image;
    img.alt = 'Stored image';
    item.appendChild(img);

    const description = document.createElement('p');
    description.textContent = record.description;
    item.appendChild(description);

    const predictions = document.createElement('pre');
    predictions.textContent = JSON.stringify(record.predictions, null, 2);
    item.appendChild(predictions);

    container.appendChild(item);
  }
});
</script>
"#;

pub async fn home() -> Html<String> {
    page("Fashion Detection", "/", HOME_BODY)
}

pub async fn upload() -> Html<String> {
    page("Upload an Image", "/upload", UPLOAD_BODY)
}

pub async fn search() -> Html<String> {
    page("Search Stored Data", "/search", SEARCH_BODY)
}
