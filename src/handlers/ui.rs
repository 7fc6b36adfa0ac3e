use axum::{
    response::Html,
    routing::get,
    Router,
};

pub fn ui_routes() -> Router {
    Router::new()
        .route("/", get(chat_page))
}

pub async fn chat_page() -> Html<String> {
    let html = r###"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>💬 Chat Assistant</title>
    <style>
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, sans-serif;
            color: #e8e8e8;
            background: linear-gradient(135deg, #1a1a2e 0%, #16213e 50%, #0f1419 100%);
            min-height: 100vh;
            display: flex;
            justify-content: center;
            align-items: center;
        }

        .chat {
            width: 100%;
            max-width: 640px;
            height: 80vh;
            display: flex;
            flex-direction: column;
            background: rgba(26, 26, 46, 0.9);
            border-radius: 12px;
            box-shadow: 0 10px 40px rgba(0, 0, 0, 0.4);
        }

        .chat-header {
            padding: 16px 20px;
            border-bottom: 1px solid rgba(255, 255, 255, 0.08);
            display: flex;
            justify-content: space-between;
            align-items: center;
        }

        .downloads a {
            color: #8ab4f8;
            margin-left: 10px;
            font-size: 0.85rem;
            text-decoration: none;
        }

        .messages {
            flex: 1;
            overflow-y: auto;
            padding: 20px;
        }

        .message {
            margin-bottom: 12px;
            padding: 10px 14px;
            border-radius: 10px;
            max-width: 80%;
            line-height: 1.4;
        }

        .message.user {
            background: #3a4a8c;
            margin-left: auto;
        }

        .message.bot {
            background: #2a2a3e;
        }

        form {
            display: flex;
            padding: 16px;
            gap: 10px;
            border-top: 1px solid rgba(255, 255, 255, 0.08);
        }

        input {
            flex: 1;
            padding: 10px 14px;
            border-radius: 8px;
            border: none;
            background: #0f1419;
            color: #e8e8e8;
        }

        button {
            padding: 10px 18px;
            border: none;
            border-radius: 8px;
            background: #667eea;
            color: white;
            cursor: pointer;
        }
    </style>
</head>
<body>
    <div class="chat">
        <div class="chat-header">
            <strong>💬 Chat Assistant</strong>
            <span class="downloads">
                Export:
                <a href="/download/csv">CSV</a>
                <a href="/download/excel">Excel</a>
                <a href="/download/pdf">PDF</a>
            </span>
        </div>
        <div class="messages" id="messages"></div>
        <form id="chat-form">
            <input id="message" type="text" placeholder="Type a message..." autocomplete="off">
            <button type="submit">Send</button>
        </form>
    </div>

    <script>
        const messages = document.getElementById('messages');
        const form = document.getElementById('chat-form');
        const input = document.getElementById('message');

        function append(text, who) {
            const div = document.createElement('div');
            div.className = 'message ' + who;
            div.textContent = text;
            messages.appendChild(div);
            messages.scrollTop = messages.scrollHeight;
        }

        form.addEventListener('submit', async (event) => {
            event.preventDefault();
            const text = input.value.trim();
            if (!text) {
                return;
            }
            append(text, 'user');
            input.value = '';

            try {
                const response = await fetch('/chat', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify({ message: text })
                });
                const data = await response.json();
                append(data.reply, 'bot');
            } catch (err) {
                append('Connection error, please try again.', 'bot');
            }
        });
    </script>
</body>
</html>
"###;
    Html(html.to_string())
}
