//! Demo councils wired up by the CLI

use council::{decorate, CouncilConfig, ListCouncil, Outcome};

/// FizzBuzz as three members.
///
/// - `fizz` says "Fizz" for multiples of 3
/// - `buzz` says "Buzz" for multiples of 5, always after `fizz`
/// - `number` says the number itself, last, and only if nobody spoke
pub fn fizzbuzz(config: CouncilConfig) -> ListCouncil<u64, String> {
    let mut council: ListCouncil<u64, String> = ListCouncil::with_config(config);

    let fizz = council.add_fn("fizz", |x, _| {
        Ok(Outcome::from_option((x % 3 == 0).then(|| "Fizz".to_string())))
    });
    council.add_fn_with(
        "buzz",
        |x, _| Ok(Outcome::from_option((x % 5 == 0).then(|| "Buzz".to_string()))),
        [decorate::after(fizz)],
    );
    council.add_fn_with(
        "number",
        |x, state| {
            let silent = state.partial_result().is_empty();
            Ok(Outcome::from_option(silent.then(|| x.to_string())))
        },
        [decorate::last()],
    );

    council
}

/// Seven boom: a number "booms" if it is divisible by 7 or contains a 7.
///
/// The first member that says `true` ends the call.
pub fn seven_boom(config: CouncilConfig) -> ListCouncil<i64, bool> {
    let mut council: ListCouncil<i64, bool> = ListCouncil::with_config(config).with_decorators([
        decorate::break_when(|said: &bool| *said),
        decorate::continue_when(|said: &bool| !*said),
    ]);

    council.add_fn("divisible", |x, _| Ok(Outcome::value(x % 7 == 0)));
    council.add_fn("has_7", |x, _| Ok(Outcome::value(x.to_string().contains('7'))));

    council
}
