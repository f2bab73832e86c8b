use super::model::{Movie, Reviewer};

/// Records ranked by `reviewer`, best first. Unranked records are skipped;
/// equal ranks fall back to display order.
pub fn ranked(movies: &[Movie], reviewer: Reviewer) -> Vec<&Movie> {
    let mut out: Vec<&Movie> = by_sort_order(movies)
        .into_iter()
        .filter(|m| reviewer.rank(m).is_some())
        .collect();
    out.sort_by_key(|m| reviewer.rank(m));
    out
}

/// Records in default display order. Ties keep their stored order.
pub fn by_sort_order(movies: &[Movie]) -> Vec<&Movie> {
    let mut out: Vec<&Movie> = movies.iter().collect();
    out.sort_by_key(|m| m.sort_order);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn titles<'a>(movies: &[&'a Movie]) -> Vec<&'a str> {
        movies.iter().map(|m| m.title.as_str()).collect()
    }

    #[test]
    fn ranked_skips_unranked_and_orders_ascending() {
        let now = Utc::now();
        let mut heat = Movie::new("1", "Heat", now);
        heat.karl_rank = Some(2);
        let mut ronin = Movie::new("2", "Ronin", now);
        ronin.karl_rank = Some(1);
        ronin.jonathan_rank = Some(1);
        let thief = Movie::new("3", "Thief", now);

        let movies = vec![heat, ronin, thief];
        assert_eq!(titles(&ranked(&movies, Reviewer::Karl)), ["Ronin", "Heat"]);
        assert_eq!(titles(&ranked(&movies, Reviewer::Jonathan)), ["Ronin"]);
    }

    #[test]
    fn zero_and_negative_ranks_are_unranked() {
        let now = Utc::now();
        let mut heat = Movie::new("1", "Heat", now);
        heat.karl_rank = Some(0);
        let mut ronin = Movie::new("2", "Ronin", now);
        ronin.karl_rank = Some(-1);
        let mut thief = Movie::new("3", "Thief", now);
        thief.karl_rank = Some(1);

        let movies = vec![heat, ronin, thief];
        assert_eq!(titles(&ranked(&movies, Reviewer::Karl)), ["Thief"]);
    }

    #[test]
    fn tied_ranks_keep_display_order() {
        let now = Utc::now();
        let mut late = Movie::new("1", "Late", now);
        late.jonathan_rank = Some(1);
        late.sort_order = 9;
        let mut early = Movie::new("2", "Early", now);
        early.jonathan_rank = Some(1);
        early.sort_order = 0;

        let movies = vec![late, early];
        assert_eq!(titles(&ranked(&movies, Reviewer::Jonathan)), ["Early", "Late"]);
    }

    #[test]
    fn sort_order_is_stable() {
        let now = Utc::now();
        let mut a = Movie::new("a", "A", now);
        a.sort_order = 5;
        let mut b = Movie::new("b", "B", now);
        b.sort_order = 1;
        let mut c = Movie::new("c", "C", now);
        c.sort_order = 5;

        let movies = vec![a, b, c];
        assert_eq!(titles(&by_sort_order(&movies)), ["B", "A", "C"]);
    }
}
