//! Static pages served next to the event stream: a liveness probe and a small
//! demo page that opens a stream and prints every line it receives.

/// The body returned by the health check
pub const HEALTH_BODY: &str = "Serving";

/// The demo page served at `/render`
pub const RENDER_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>SSE Client</title>
</head>
<body>
    <h1>Server-Sent Events Demo</h1>
    <div id="events"></div>

    <script>
        const eventSource = new EventSource('/events');

        eventSource.onmessage = function(e) {
            const eventDiv = document.getElementById('events');
            const p = document.createElement('p');
            p.textContent = e.data;
            eventDiv.appendChild(p);
        };

        eventSource.onerror = function(e) {
            console.error('SSE error:', e);
        };
    </script>
</body>
</html>
"#;
