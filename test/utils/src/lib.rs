#![allow(clippy::needless_return)]

/// An explanation the way the backend writes them when clean code blocks come
/// back empty, with code embedded in Markdown fences.
pub fn explanation_fixture() -> &'static str {
    return r#"
## Approach

Walk the list once, flipping each `next` pointer as you go.

```python
def reverse(head):
    prev = None
    while head:
        head.next, prev, head = prev, head, head.next
    return prev
```

The same idea in Javascript.

```javascript
function reverse(head) {
    let prev = null;
    while (head) {
        [head.next, prev, head] = [prev, head, head.next];
    }
    return prev;
}
```

A fence without a language still counts.

```
O(n) time, O(1) space
```

That's it!
"#
    .trim();
}

/// A `/search` response body for "reverse a linked list".
pub fn search_response_fixture() -> &'static str {
    return r#"
{
    "question_text": "Reverse a singly linked list",
    "language": "python",
    "code_blocks": [
        { "language": "Statement", "code": "Reverse a singly linked list" },
        { "language": "python", "code": "def reverse(head):\n    prev = None\n    while head:\n        head.next, prev, head = prev, head, head.next\n    return prev" }
    ],
    "clean_code_blocks": [
        { "language": "Restatement", "code": "Given the head of a list, reverse it." },
        { "language": "python", "code": "def reverse(head):\n    prev = None\n    while head:\n        head.next, prev, head = prev, head, head.next\n    return prev" },
        { "language": "python", "code": "   " }
    ],
    "explanation": "Iterate once and flip pointers.",
    "approach_type": "original",
    "search_hash": "9f1c2a",
    "image_paths": [],
    "session_id": "S1",
    "can_generate_alternative": true
}
"#
    .trim();
}
