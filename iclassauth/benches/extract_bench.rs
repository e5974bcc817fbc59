// iClassAuth page-scraping benchmarks using criterion.
//
// Measures:
//   - hidden `execution` lookup on a login page at various padding sizes
//   - continue-form token extraction on the weak-password interstitial

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use iclassauth::handshake::{ContinuePage, ExecutionToken, LoginPage};
use iclassauth::html;

const FORM: &str = r#"
<form id="fm1" action="/login" method="post">
  <input id="username" name="username" type="text" value="">
  <input id="password" name="password" type="password" value="">
  <input type="hidden" name="execution" value="e1s1-9f8a7b6c5d4e3f2a1b0c"/>
  <input type="hidden" name="_eventId" value="submit"/>
</form>"#;

const INTERSTITIAL: &str = r#"
<form id="fm1"><input type="hidden" name="execution" value="stale"></form>
<form id="continueForm" action="/login" method="post">
  <input type="hidden" name="execution" value="e1s2-0c1b2a3f4e5d6c7b8a9f">
  <input type="hidden" name="_eventId" value="ignoreAndContinue">
</form>"#;

/// A login page with `padding` bytes of unrelated markup before the form,
/// the way the real page carries scripts and styles ahead of it.
fn login_page(padding: usize) -> String {
    let filler = "<div class=\"tip\"><span>统一身份认证</span></div>\n";
    let mut page = String::with_capacity(padding + FORM.len());
    while page.len() < padding {
        page.push_str(filler);
    }
    page.push_str(FORM);
    page
}

// ---------------------------------------------------------------------------
// Login page token
// ---------------------------------------------------------------------------

fn bench_login_token(c: &mut Criterion) {
    let mut group = c.benchmark_group("login_execution");
    for &size in &[1024usize, 16 * 1024, 128 * 1024] {
        let page = login_page(size);
        group.throughput(Throughput::Bytes(page.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &page, |b, page| {
            b.iter(|| {
                black_box(ExecutionToken::<LoginPage>::from_login_page(black_box(page)));
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Interstitial continue token
// ---------------------------------------------------------------------------

fn bench_continue_token(c: &mut Criterion) {
    c.bench_function("continue_execution", |b| {
        b.iter(|| {
            black_box(ExecutionToken::<ContinuePage>::from_interstitial(black_box(INTERSTITIAL)).ok());
        });
    });

    c.bench_function("hidden_field_event_id", |b| {
        b.iter(|| {
            black_box(html::hidden_field(black_box(FORM), "_eventId"));
        });
    });
}

criterion_group!(benches, bench_login_token, bench_continue_token);
criterion_main!(benches);
