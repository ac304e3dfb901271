//! GLONASS L1 C/A signal and PZ-90 physical constants.

pub const GNAV_STRING_DATA_BITS: usize = 85;
pub const GNAV_STRING_BITS: usize = 115; // 85 data bits + 30-bit time mark

/// 30-bit time mark transmitted with every string.
pub const GNAV_TIME_MARK: [u8; 30] = [
    1, 1, 1, 1, 1, 0, 0, 0, 1, 1, 0, 1, 1, 1, 0, 1, 0, 1, 0, 0, 0, 0, 1, 0, 0, 1, 0, 1, 1, 0,
];

// Field scale factors (ICD ed. 5.1, tables 4.5 and 4.9)
pub const P2_5: f64 = 0.03125; /* 2^-5 */
pub const P2_9: f64 = 1.953125e-3; /* 2^-9 */
pub const P2_11: f64 = 4.8828125e-4; /* 2^-11 */
pub const P2_14: f64 = 6.103515625e-5; /* 2^-14 */
pub const P2_15: f64 = 3.0517578125e-5; /* 2^-15 */
pub const P2_18: f64 = 3.814697265625e-6; /* 2^-18 */
pub const P2_20: f64 = 9.5367431640625e-7; /* 2^-20 */
pub const P2_30: f64 = 9.313225746154785e-10; /* 2^-30 */
pub const P2_31: f64 = 4.656612873077393e-10; /* 2^-31 */
pub const P2_40: f64 = 9.094947017729282e-13; /* 2^-40 */
pub const SC2RAD: f64 = 3.1415926535898; /* semi-circle to radian */

// PZ-90 geopotential and rotation
pub const GLONASS_GM: f64 = 398600.4418; /* [km^3/s^2] */
pub const GLONASS_EARTH_RADIUS: f64 = 6378.136; /* equatorial radius [km] */
pub const GLONASS_OMEGA_EARTH: f64 = 7.292115e-5; /* rotation rate [rad/s] */
pub const GLONASS_J2: f64 = 1082625.75e-9; /* second zonal harmonic */
pub const GLONASS_J4: f64 = -2370.89e-9; /* fourth zonal harmonic */

// Luni-solar perturbation model (ICD appendix, Newcomb 1900.0 polynomials).
// Sexagesimal forms pre-converted to degrees.
pub const MOON_GM: f64 = 4902.835; /* [km^3/s^2] */
pub const MOON_SEMI_MAJOR_AXIS: f64 = 3.84385243e5; /* [km] */
pub const MOON_ECCENTRICITY: f64 = 0.054900489;
pub const MOON_INCLINATION_DEG: f64 = 5.145389; /* 5deg 08'43.4'' */
pub const MOON_Q0_DEG: f64 = -63.895392; /* mean anomaly, -63deg 53'43''.41 */
pub const MOON_Q1_DEG: f64 = 477198.849108; /* +477198deg 50'56''.79 / cy */
pub const MOON_OMEGA0_DEG: f64 = 259.183275; /* node, 259deg 10'59''.79 */
pub const MOON_OMEGA1_DEG: f64 = -1934.142008; /* -1934deg 08'31''.23 / cy */
pub const MOON_TAU0_DEG: f64 = -334.329556; /* perigee lon, -334deg 19'46''.40 */
pub const MOON_TAU1_DEG: f64 = 4069.034033; /* +4069deg 02'02''.52 / cy */

pub const SUN_GM: f64 = 0.1325263e12; /* [km^3/s^2] */
pub const SUN_SEMI_MAJOR_AXIS: f64 = 1.49598e8; /* [km] */
pub const SUN_ECCENTRICITY: f64 = 0.016719;
pub const SUN_Q0_DEG: f64 = 358.475844; /* mean anomaly, 358deg 28'33''.04 */
pub const SUN_Q1_DEG: f64 = 35999.049750; /* 129596579''.10 / cy */
pub const SUN_OMEGA0_DEG: f64 = 281.220833; /* perigee lon, 281deg 13'15''.0 */
pub const SUN_OMEGA1_DEG: f64 = 1.719175; /* 6189''.03 / cy */
pub const ECLIPTIC_OBLIQUITY_DEG: f64 = 23.4425; /* 23deg 26'33'' */

// GLONASS four-year-cycle calendar origin: JD0 = 1461*(N4-1) + NT + base
pub const GLONASS_JD0_BASE: f64 = 2450082.5;
pub const SEC_PER_DAY: f64 = 86400.0;
/// Broadcast times are referenced to Moscow decree time (UTC+3h).
pub const MOSCOW_UTC_OFFSET_SEC: f64 = 10800.0;

/// Extrapolation age beyond which a propagated state is flagged stale.
pub const EPHEMERIS_MAX_AGE_SEC: f64 = 1800.0;
